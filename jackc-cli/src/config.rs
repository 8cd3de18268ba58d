//! Compiler settings loaded from a YAML file.
use std::{fs, path::Path};

use jackc::prelude::CompileConf;
use log::debug;

use crate::error::AppResult;

/// Load compiler settings from the given file.
///
/// Keys missing from the document keep their default values.
pub fn load_conf(filepath: &Path) -> AppResult<CompileConf> {
    let mut file = fs::File::open(filepath)?;

    let conf: CompileConf = serde_yaml::from_reader(&mut file)?;
    debug!("loaded configuration {}: {conf:?}", filepath.display());

    Ok(conf)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;
    use jackc::constants::DEFAULT_MAX_DEPTH;

    #[test]
    fn test_load_conf() {
        let dir = tempfile::tempdir().unwrap();

        let filepath = dir.path().join("jackc.yaml");
        fs::write(&filepath, "max_depth: 64\n").unwrap();
        assert_eq!(load_conf(&filepath).unwrap().max_depth, 64);

        let filepath = dir.path().join("empty.yaml");
        fs::write(&filepath, "{}\n").unwrap();
        assert_eq!(load_conf(&filepath).unwrap().max_depth, DEFAULT_MAX_DEPTH);

        let filepath = dir.path().join("broken.yaml");
        fs::write(&filepath, "max_depth: deep\n").unwrap();
        assert!(matches!(
            load_conf(&filepath).unwrap_err().kind,
            ErrorKind::Config(_)
        ));
    }
}
