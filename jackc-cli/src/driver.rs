//! Locates compilation units and manages their output files.
use std::{
    fs,
    io::BufWriter,
    path::{Path, PathBuf},
};

use jackc::{
    constants::{OUTPUT_EXTENSION, SOURCE_EXTENSION},
    prelude::*,
};
use log::{error, info};

use crate::error::{AppError, AppResult, ErrorKind};

/// Outcome of compiling one source file.
#[derive(Debug)]
pub struct UnitReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub result: AppResult<CompileStats>,
}

/// List the source files named by the given path.
///
/// A file is taken as is. A directory yields its `.jack` files,
/// without descending into subdirectories, sorted by name.
pub fn find_units(path: &Path) -> AppResult<Vec<PathBuf>> {
    if !path.is_dir() {
        // Fail early with the file system's own error.
        fs::metadata(path)?;
        return Ok(vec![path.to_path_buf()]);
    }

    let mut units = Vec::new();
    for entry in fs::read_dir(path)? {
        let filepath = entry?.path();
        let is_source = filepath.extension().map_or(false, |ext| ext == SOURCE_EXTENSION);
        if is_source && filepath.is_file() {
            units.push(filepath);
        }
    }

    if units.is_empty() {
        return Err(AppError {
            kind: ErrorKind::NoSources(path.to_path_buf()),
        });
    }

    units.sort();
    Ok(units)
}

/// `Xxx.jack` compiles to `Xxx.vm` in the same directory.
pub fn output_path(source: &Path) -> PathBuf {
    source.with_extension(OUTPUT_EXTENSION)
}

/// Compile one source file into its output file.
///
/// The output file is created, or truncated, before compilation starts.
/// On failure whatever was written up to the error is left in place.
pub fn compile_unit(source: &Path, output: &Path, conf: &CompileConf) -> AppResult<CompileStats> {
    let bytes = fs::read(source)?;
    let source_code = String::from_utf8(bytes).map_err(JackError::from)?;

    let outfile = BufWriter::new(fs::File::create(output)?);
    let stats = compile(&source_code, outfile, conf)?;

    Ok(stats)
}

/// Compile every unit named by the path.
///
/// Units are independent. A failing unit is logged and
/// the remaining units are still compiled.
pub fn compile_path(path: &Path, conf: &CompileConf) -> AppResult<Vec<UnitReport>> {
    let units = find_units(path)?;
    let mut reports = Vec::with_capacity(units.len());

    for source in units {
        let output = output_path(&source);
        let result = compile_unit(&source, &output, conf);

        match &result {
            Ok(stats) => info!(
                "{} -> {} ({} instructions)",
                source.display(),
                output.display(),
                stats.instructions
            ),
            Err(err) => error!("{}: {err}", source.display()),
        }

        reports.push(UnitReport {
            source,
            output,
            result,
        });
    }

    Ok(reports)
}

#[cfg(test)]
mod test {
    use super::*;

    const MAIN: &str = "class Main {\n  function void main() {\n    do Output.printInt(7);\n    return;\n  }\n}\n";
    const BROKEN: &str = "class Broken {\n  function void f() {\n    let = 1;\n  }\n}\n";

    #[test]
    fn test_output_path() {
        assert_eq!(output_path(Path::new("dir/Main.jack")), PathBuf::from("dir/Main.vm"));
    }

    #[test]
    fn test_find_units() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Main.jack"), MAIN).unwrap();
        fs::write(dir.path().join("Ball.jack"), MAIN).unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("Deep.jack"), MAIN).unwrap();

        let units = find_units(dir.path()).unwrap();
        assert_eq!(
            units,
            [dir.path().join("Ball.jack"), dir.path().join("Main.jack")]
        );

        let single = dir.path().join("notes.txt");
        assert_eq!(find_units(&single).unwrap(), [single]);

        let missing = dir.path().join("Missing.jack");
        assert!(matches!(find_units(&missing).unwrap_err().kind, ErrorKind::Io(_)));
    }

    #[test]
    fn test_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_units(dir.path()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::NoSources(_)));
    }

    #[test]
    fn test_compile_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Main.jack"), MAIN).unwrap();
        fs::write(dir.path().join("Broken.jack"), BROKEN).unwrap();
        // Stale output is replaced.
        fs::write(dir.path().join("Main.vm"), "stale\n").unwrap();

        let reports = compile_path(dir.path(), &CompileConf::default()).unwrap();
        assert_eq!(reports.len(), 2);

        // Sorted by name, and the failure does not stop the next unit.
        assert_eq!(reports[0].source, dir.path().join("Broken.jack"));
        assert!(matches!(
            reports[0].result.as_ref().unwrap_err().kind,
            ErrorKind::Jack(JackError::Syntax(_))
        ));
        assert_eq!(
            fs::read_to_string(&reports[0].output).unwrap(),
            "function Broken.f 0\n"
        );

        let stats = reports[1].result.as_ref().unwrap();
        assert_eq!(stats.class_name, "Main");
        assert_eq!(
            fs::read_to_string(dir.path().join("Main.vm")).unwrap(),
            "function Main.main 0\n\
             push constant 7\n\
             call Output.printInt 1\n\
             pop temp 0\n\
             push constant 0\n\
             return\n"
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Bad.jack");
        fs::write(&source, [0x63, 0xFF, 0xFE]).unwrap();

        let err = compile_unit(&source, &output_path(&source), &CompileConf::default()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Jack(JackError::Utf8(_))));
    }
}
