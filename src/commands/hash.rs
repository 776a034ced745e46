use disk_shadow_probe::integrity::digest_entry;

pub fn run(bytes: &[u8]) -> Result<(), String> {
    let digest = digest_entry(bytes);
    println!("SHA-256: {}", digest.sha256);
    println!("SHA-512: {}", digest.sha512);
    Ok(())
}
