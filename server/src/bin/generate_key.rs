use base64::Engine as _;
use rand::RngCore;

/// Prints a fresh secret suitable for the `SECRET_KEY` environment
/// variable, which keys both session cookies and reset tokens.
fn main() {
    let mut secret = [0u8; 64];
    rand::thread_rng().fill_bytes(&mut secret);

    println!(
        "{}",
        base64::engine::general_purpose::STANDARD.encode(secret)
    );
}
