use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use std::fs;
use std::path::Path;

/// Ed25519 keypair of this QoS monitor
#[derive(Clone)]
pub struct KeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Create a new keypair from a signing key
    pub fn new(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self { signing_key, verifying_key }
    }

    /// Get the public key as bytes
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Get the public key as hex string, used as a short identity in logs
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }

    /// Get the public key as standard base64, the form peers expect
    pub fn public_key_base64(&self) -> String {
        STANDARD.encode(self.public_key_bytes())
    }

    /// Sign a message and return the signature as base64
    pub fn sign_base64(&self, message: &[u8]) -> String {
        STANDARD.encode(self.signing_key.sign(message).to_bytes())
    }
}

/// Verify a base64 signature against a base64 public key
pub fn verify_base64(public_key: &str, message: &[u8], signature: &str) -> Result<()> {
    let key_bytes: [u8; 32] = STANDARD
        .decode(public_key)
        .context("Public key is not valid base64")?
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow::anyhow!("Invalid public key length: {}", bytes.len()))?;
    let signature_bytes: [u8; 64] = STANDARD
        .decode(signature)
        .context("Signature is not valid base64")?
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow::anyhow!("Invalid signature length: {}", bytes.len()))?;

    let verifying_key = VerifyingKey::from_bytes(&key_bytes)?;
    verifying_key
        .verify(message, &Signature::from_bytes(&signature_bytes))
        .context("Signature verification failed")
}

/// Generate a new Ed25519 keypair
pub fn generate_keypair() -> KeyPair {
    let mut csprng = OsRng;
    let mut secret_bytes = [0u8; 32];
    rand::RngCore::fill_bytes(&mut csprng, &mut secret_bytes);
    KeyPair::new(SigningKey::from_bytes(&secret_bytes))
}

/// Save a keypair to a file
pub fn save_keypair(keypair: &KeyPair, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(path, keypair.signing_key.to_bytes()).context("Failed to write keypair to file")?;

    tracing::info!("Saved keypair to: {}", path.display());
    Ok(())
}

/// Load a keypair from a file
pub fn load_keypair(path: &Path) -> Result<KeyPair> {
    let secret_bytes = fs::read(path).context("Failed to read keypair file")?;

    if secret_bytes.len() != 32 {
        anyhow::bail!("Invalid keypair file: expected 32 bytes, got {}", secret_bytes.len());
    }

    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&secret_bytes);
    Ok(KeyPair::new(SigningKey::from_bytes(&bytes)))
}

/// Load or generate a keypair
pub fn load_or_generate_keypair(path: &Path) -> Result<KeyPair> {
    if path.exists() {
        tracing::info!("Loading existing keypair from: {}", path.display());
        load_keypair(path)
    } else {
        tracing::info!("Generating new keypair and saving to: {}", path.display());
        let keypair = generate_keypair();
        save_keypair(&keypair, path)?;
        Ok(keypair)
    }
}
