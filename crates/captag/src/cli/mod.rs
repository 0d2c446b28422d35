//! Command handlers.

pub mod config;
pub mod inspect;
pub mod run;
mod theme;

/// Convert a dialoguer result into `Ok(Some(value))` on success, `Ok(None)` on
/// interrupt (Ctrl+C / terminal disconnect), and `Err` for other I/O failures.
fn handle_interrupt<T>(result: dialoguer::Result<T>) -> anyhow::Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(dialoguer::Error::IO(e)) if e.kind() == std::io::ErrorKind::Interrupted => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_interrupt() {
        assert_eq!(handle_interrupt(Ok(3)).unwrap(), Some(3));

        let interrupted: dialoguer::Result<u8> = Err(dialoguer::Error::IO(std::io::Error::from(
            std::io::ErrorKind::Interrupted,
        )));
        assert_eq!(handle_interrupt(interrupted).unwrap(), None);

        let broken: dialoguer::Result<u8> = Err(dialoguer::Error::IO(std::io::Error::from(
            std::io::ErrorKind::BrokenPipe,
        )));
        assert!(handle_interrupt(broken).is_err());
    }
}
