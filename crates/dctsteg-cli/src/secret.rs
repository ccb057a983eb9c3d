//! Secret acquisition from an inherited file descriptor.
//!
//! When no secret is given on the command line it is read from file
//! descriptor 4, which lets shell pipelines feed the key without it showing
//! up in the process list. NUL bytes are excised (not merely trimmed) so the
//! secret survives interfaces that cannot carry them, and a trailing run of
//! whitespace from `echo`-style producers is stripped.

use std::io::{self, Read};

use zeroize::Zeroizing;

/// Descriptor the secret arrives on when not given as an argument.
pub const SECRET_FD: i32 = 4;

/// Reads the secret from `fd`. Fails if nothing can be read or the
/// descriptor delivers no bytes at all.
#[cfg(unix)]
pub fn read_from_fd(fd: i32) -> io::Result<Zeroizing<Vec<u8>>> {
    use std::fs::File;
    use std::os::fd::FromRawFd;

    // SAFETY: we take ownership of a descriptor the invoking shell opened
    // for us; it is closed when the File drops.
    let mut file = unsafe { File::from_raw_fd(fd) };
    let mut secret = Zeroizing::new(Vec::new());
    file.read_to_end(&mut secret)?;
    if secret.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no secret on the descriptor",
        ));
    }
    tidy(&mut secret);
    Ok(secret)
}

#[cfg(not(unix))]
pub fn read_from_fd(_fd: i32) -> io::Result<Zeroizing<Vec<u8>>> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "secret descriptors require a unix platform",
    ))
}

/// Excises NUL bytes, then strips the trailing whitespace run.
pub fn tidy(secret: &mut Vec<u8>) {
    secret.retain(|&b| b != 0);
    while matches!(secret.last(), Some(b' ' | b'\t' | b'\n' | 0)) {
        secret.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nuls_are_excised_everywhere() {
        let mut secret = b"sw\0ord\0fish\0".to_vec();
        tidy(&mut secret);
        assert_eq!(secret, b"swordfish");
    }

    #[test]
    fn trailing_whitespace_goes_away() {
        let mut secret = b"swordfish \t\n\n".to_vec();
        tidy(&mut secret);
        assert_eq!(secret, b"swordfish");
    }

    #[test]
    fn interior_whitespace_stays() {
        let mut secret = b"sword fish\n".to_vec();
        tidy(&mut secret);
        assert_eq!(secret, b"sword fish");
    }

    #[test]
    fn all_whitespace_collapses_to_empty() {
        let mut secret = b" \n\t".to_vec();
        tidy(&mut secret);
        assert!(secret.is_empty());
    }
}
