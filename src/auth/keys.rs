use jsonwebtoken::{DecodingKey, EncodingKey};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Ed25519 key pair used to sign and verify tokens.
#[derive(Clone)]
pub struct Keys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

#[derive(thiserror::Error, Debug)]
pub enum KeyError {
    #[error("could not read key file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed Ed25519 PEM key: {0}")]
    Malformed(#[from] jsonwebtoken::errors::Error),
}

impl Keys {
    pub fn from_pem(private_pem: &[u8], public_pem: &[u8]) -> Result<Keys, KeyError> {
        Ok(Keys {
            encoding: EncodingKey::from_ed_pem(private_pem)?,
            decoding: DecodingKey::from_ed_pem(public_pem)?,
        })
    }

    pub fn from_pem_files(
        private_path: impl AsRef<Path>,
        public_path: impl AsRef<Path>,
    ) -> Result<Keys, KeyError> {
        let private_pem = read(private_path.as_ref())?;
        let public_pem = read(public_path.as_ref())?;
        Keys::from_pem(&private_pem, &public_pem)
    }
}

fn read(path: &Path) -> Result<Vec<u8>, KeyError> {
    fs::read(path).map_err(|source| KeyError::Read {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_names_the_path() {
        let err = Keys::from_pem_files("/nonexistent/private.pem", "/nonexistent/public.pem")
            .err()
            .unwrap();
        assert!(matches!(err, KeyError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/private.pem"));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = Keys::from_pem(b"not a key", b"not a key").err().unwrap();
        assert!(matches!(err, KeyError::Malformed(_)));
    }

    #[test]
    fn loads_fixture_pair() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/keys");
        assert!(Keys::from_pem_files(
            format!("{}/ed25519_private.pem", dir),
            format!("{}/ed25519_public.pem", dir),
        )
        .is_ok());
    }
}
