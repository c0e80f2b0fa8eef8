use thiserror::Error;

/// Engine error taxonomy.
///
/// `Config` errors are fatal and surface synchronously at construction
/// time; a session must not start from an invalid trial design. Asset
/// failures are non-fatal at runtime (draws/plays are skipped) and only
/// become an error when reported by a loader.
#[derive(Error, Debug)]
pub enum GameError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("asset failed to load: {0}")]
    Asset(String),

    #[error("audio cue unavailable: {0}")]
    Cue(String),
}

impl GameError {
    pub fn config(msg: impl Into<String>) -> Self {
        GameError::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = GameError::config("obstruction and velocity catalogs differ in length");
        assert!(err.to_string().contains("catalogs differ"));
    }
}
