//! gmsh command-line engine
//!
//! Drives the `gmsh` executable through generated `.geo` scripts. A session
//! records the commands issued so far; each query replays them in a fresh
//! non-interactive gmsh process and reads the answers back from files
//! written with `Printf`.
//!
//! Limitations of the script interface:
//! - entity tags are synthesized as `1..=count` per dimension
//! - the bounding box comes from gmsh's `General.Min*`/`General.Max*`
//! - part names are read from STEP `PRODUCT` records and assigned to
//!   volumes in file order

use super::engine::{EngineError, Entity, MeshEngine, GENERAL_TERMINAL};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::debug;

const SENTINEL_FILE: &str = "done.txt";
const COUNTS_FILE: &str = "counts.txt";
const BBOX_FILE: &str = "bbox.txt";
const MESH_FILE: &str = "mesh.msh";
const SCRIPT_FILE: &str = "script.geo";

/// Engine backed by the gmsh executable
pub struct GmshCli {
    binary: String,
    session: Option<ScriptSession>,
}

/// Per-session scratch state
struct ScriptSession {
    scratch: TempDir,
    lines: Vec<String>,
    occ_factory: bool,
    /// Part names read from the loaded STEP file
    product_names: Vec<String>,
    mesh_ready: bool,
}

impl ScriptSession {
    fn scratch_file(&self, name: &str) -> PathBuf {
        self.scratch.path().join(name)
    }
}

impl GmshCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            session: None,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn session(&self) -> Result<&ScriptSession, EngineError> {
        self.session.as_ref().ok_or(EngineError::NoSession)
    }

    fn session_mut(&mut self) -> Result<&mut ScriptSession, EngineError> {
        self.session.as_mut().ok_or(EngineError::NoSession)
    }

    /// Replay the recorded script followed by `extra`, in a fresh gmsh process
    fn run(&self, extra: &[String]) -> Result<(), EngineError> {
        let session = self.session()?;
        let sentinel = session.scratch_file(SENTINEL_FILE);
        if sentinel.exists() {
            std::fs::remove_file(&sentinel)?;
        }

        let mut script: Vec<String> = session.lines.clone();
        script.extend_from_slice(extra);
        script.push(format!("Printf(\"done\") > {};", quote(&sentinel)));

        let script_path = session.scratch_file(SCRIPT_FILE);
        std::fs::write(&script_path, script.join("\n") + "\n")?;

        debug!(script = %script_path.display(), lines = script.len(), "Running gmsh");

        let output = Command::new(&self.binary)
            .arg(&script_path)
            .arg("-")
            .arg("-nopopup")
            .output()
            .map_err(|e| launch_error(&self.binary, e))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if let Some(message) = first_error_line(&stdout).or_else(|| first_error_line(&stderr)) {
            return Err(EngineError::Command {
                status: output.status.code(),
                message,
            });
        }
        if !output.status.success() {
            return Err(EngineError::Command {
                status: output.status.code(),
                message: format!("gmsh exited with {}", output.status),
            });
        }
        if !sentinel.exists() {
            return Err(EngineError::Command {
                status: output.status.code(),
                message: "gmsh stopped before the end of the script".to_string(),
            });
        }
        Ok(())
    }

    fn require_file(path: &Path) -> Result<(), EngineError> {
        if path.is_file() {
            Ok(())
        } else {
            Err(EngineError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path.display()),
            )))
        }
    }
}

impl MeshEngine for GmshCli {
    fn query_version(&mut self) -> Result<String, EngineError> {
        let output = Command::new(&self.binary)
            .arg("--version")
            .output()
            .map_err(|e| launch_error(&self.binary, e))?;

        if !output.status.success() {
            return Err(EngineError::Command {
                status: output.status.code(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // gmsh prints its version on stderr in older releases
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        Ok(first_line(&stdout)
            .or_else(|| first_line(&stderr))
            .unwrap_or_default())
    }

    fn initialize(&mut self) -> Result<(), EngineError> {
        let scratch = tempfile::Builder::new().prefix("ladder_gmsh_").tempdir()?;
        self.session = Some(ScriptSession {
            scratch,
            lines: Vec::new(),
            occ_factory: false,
            product_names: Vec::new(),
            mesh_ready: false,
        });
        Ok(())
    }

    fn finalize(&mut self) {
        // Dropping the TempDir removes the scratch directory
        self.session = None;
    }

    fn add_model(&mut self, name: &str) -> Result<(), EngineError> {
        let session = self.session_mut()?;
        session.lines.push(format!("// model {}", name));
        Ok(())
    }

    fn set_number(&mut self, key: &str, value: f64) -> Result<(), EngineError> {
        let session = self.session_mut()?;
        // Terminal output is how errors are detected
        if key != GENERAL_TERMINAL {
            session.lines.push(format!("{} = {};", key, value));
        }
        session.mesh_ready = false;
        Ok(())
    }

    fn import_shapes(&mut self, path: &Path) -> Result<(), EngineError> {
        Self::require_file(path)?;
        let product_names = if is_step_file(path) {
            read_step_product_names(path)
        } else {
            Vec::new()
        };

        let session = self.session_mut()?;
        if !session.occ_factory {
            session.lines.push("SetFactory(\"OpenCASCADE\");".to_string());
            session.occ_factory = true;
        }
        session.lines.push(format!("ShapeFromFile({});", quote(path)));
        session.product_names = product_names;
        Ok(())
    }

    fn synchronize(&mut self) -> Result<(), EngineError> {
        // Script geometry is synchronized implicitly; validate the load instead
        self.run(&[])
    }

    fn merge(&mut self, path: &Path) -> Result<(), EngineError> {
        Self::require_file(path)?;
        self.session_mut()?.lines.push(format!("Merge {};", quote(path)));
        self.run(&[])
    }

    fn entities(&mut self) -> Result<Vec<Entity>, EngineError> {
        let counts_path = self.session()?.scratch_file(COUNTS_FILE);
        self.run(&[
            "ladder_p[] = Point{:};".to_string(),
            "ladder_c[] = Curve{:};".to_string(),
            "ladder_s[] = Surface{:};".to_string(),
            "ladder_v[] = Volume{:};".to_string(),
            format!(
                "Printf(\"%g %g %g %g\", #ladder_p[], #ladder_c[], #ladder_s[], #ladder_v[]) > {};",
                quote(&counts_path)
            ),
        ])?;

        let counts = parse_numbers(&std::fs::read_to_string(&counts_path)?, 4)?;
        let mut entities = Vec::new();
        for (dim, count) in counts.into_iter().enumerate() {
            let count = count.max(0.0) as i32;
            entities.extend((1..=count).map(|tag| (dim as i32, tag)));
        }
        Ok(entities)
    }

    fn bounding_box(&mut self) -> Result<[f64; 6], EngineError> {
        let bbox_path = self.session()?.scratch_file(BBOX_FILE);
        self.run(&[format!(
            "Printf(\"%g %g %g %g %g %g\", General.MinX, General.MinY, General.MinZ, \
             General.MaxX, General.MaxY, General.MaxZ) > {};",
            quote(&bbox_path)
        )])?;

        let values = parse_numbers(&std::fs::read_to_string(&bbox_path)?, 6)?;
        let mut bbox = [0.0; 6];
        bbox.copy_from_slice(&values);
        Ok(bbox)
    }

    fn entity_name(&mut self, dim: i32, tag: i32) -> Result<String, EngineError> {
        let session = self.session()?;
        if dim != 3 || tag < 1 {
            return Ok(String::new());
        }
        Ok(session
            .product_names
            .get(tag as usize - 1)
            .cloned()
            .unwrap_or_default())
    }

    fn generate(&mut self, dim: i32) -> Result<(), EngineError> {
        let mesh_path = self.session()?.scratch_file(MESH_FILE);
        self.run(&[format!("Mesh {};", dim), format!("Save {};", quote(&mesh_path))])?;
        if !mesh_path.is_file() {
            return Err(EngineError::Command {
                status: None,
                message: "gmsh produced no mesh".to_string(),
            });
        }
        self.session_mut()?.mesh_ready = true;
        Ok(())
    }

    fn write(&mut self, path: &Path) -> Result<(), EngineError> {
        let session = self.session()?;
        if !session.mesh_ready {
            return Err(EngineError::Command {
                status: None,
                message: "no mesh has been generated".to_string(),
            });
        }
        let mesh_path = session.scratch_file(MESH_FILE);

        // Re-export the saved mesh only; replaying the geometry would remesh it
        let saved = std::mem::take(&mut self.session_mut()?.lines);
        self.session_mut()?
            .lines
            .push(format!("Merge {};", quote(&mesh_path)));
        let result = self.run(&[format!("Save {};", quote(path))]);
        self.session_mut()?.lines = saved;
        result
    }
}

fn launch_error(binary: &str, e: std::io::Error) -> EngineError {
    if e.kind() == std::io::ErrorKind::NotFound {
        EngineError::NotInstalled(format!("{} not found", binary))
    } else {
        EngineError::Launch(e.to_string())
    }
}

/// Double-quoted `.geo` string literal for a path
fn quote(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/").replace('"', "\\\"");
    format!("\"{}\"", text)
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// First gmsh `Error   : ...` line, without the prefix
fn first_error_line(text: &str) -> Option<String> {
    text.lines().map(str::trim).find_map(|line| {
        let rest = line.strip_prefix("Error")?;
        let rest = rest.trim_start();
        let message = rest.strip_prefix(':').unwrap_or(rest).trim();
        Some(if message.is_empty() {
            line.to_string()
        } else {
            message.to_string()
        })
    })
}

fn parse_numbers(text: &str, expected: usize) -> Result<Vec<f64>, EngineError> {
    let values: Vec<f64> = text
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f64>()
                .map_err(|_| EngineError::Parse(format!("not a number: {}", token)))
        })
        .collect::<Result<_, _>>()?;

    if values.len() != expected {
        return Err(EngineError::Parse(format!(
            "expected {} values, got {}",
            expected,
            values.len()
        )));
    }
    Ok(values)
}

fn is_step_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("step") || ext.eq_ignore_ascii_case("stp"))
        .unwrap_or(false)
}

/// Best-effort scan of a STEP file for product names
fn read_step_product_names(path: &Path) -> Vec<String> {
    match std::fs::read(path) {
        Ok(bytes) => step_product_names(&String::from_utf8_lossy(&bytes)),
        Err(e) => {
            debug!("Could not read {} for part names: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Names of `PRODUCT('name', ...)` records, in file order
fn step_product_names(text: &str) -> Vec<String> {
    const KEYWORD: &str = "PRODUCT";
    let mut names = Vec::new();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find(KEYWORD) {
        let start = search_from + offset;
        let after = start + KEYWORD.len();
        search_from = after;

        let preceded_by_ident = text[..start]
            .chars()
            .next_back()
            .map(|c| c.is_ascii_alphanumeric() || c == '_')
            .unwrap_or(false);
        if preceded_by_ident {
            continue;
        }

        let rest = text[after..].trim_start();
        let Some(rest) = rest.strip_prefix('(') else {
            continue;
        };
        let Some(rest) = rest.trim_start().strip_prefix('\'') else {
            continue;
        };
        if let Some(name) = read_step_string(rest) {
            let name = name.trim().to_string();
            if !name.is_empty() {
                names.push(name);
            }
        }
    }
    names
}

/// STEP string body up to the closing quote; `''` is an escaped quote
fn read_step_string(text: &str) -> Option<String> {
    let mut value = String::new();
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                value.push('\'');
            } else {
                return Some(value);
            }
        } else {
            value.push(c);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_product_names_in_order() {
        let text = "\
#10=PRODUCT_DEFINITION('design','',#11,#12);
#11=PRODUCT('Bracket','Bracket','',(#13));
#20=PRODUCT ( 'Bolt M6' , '', '', (#13));
#30=PRODUCT('It''s a pin','','',(#13));
";
        assert_eq!(
            step_product_names(text),
            vec!["Bracket".to_string(), "Bolt M6".to_string(), "It's a pin".to_string()]
        );
    }

    #[test]
    fn test_step_product_names_skip_empty_and_prefixed() {
        let text = "#1=PRODUCT('','','',(#2));\n#3=MYPRODUCT('Nope');\n#4=PRODUCT_CONTEXT('ctx');";
        assert!(step_product_names(text).is_empty());
    }

    #[test]
    fn test_unterminated_step_string_ignored() {
        assert!(step_product_names("#1=PRODUCT('broken").is_empty());
    }

    #[test]
    fn test_first_error_line() {
        let output = "Info    : Reading 'a.step'\nError   : Could not read file 'a.step'\nInfo    : Done\n";
        assert_eq!(
            first_error_line(output),
            Some("Could not read file 'a.step'".to_string())
        );
        assert_eq!(first_error_line("Info    : all good"), None);
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_numbers("8 12 6 1\n", 4).unwrap(), vec![8.0, 12.0, 6.0, 1.0]);
        assert!(parse_numbers("8 12 6", 4).is_err());
        assert!(parse_numbers("8 x 6 1", 4).is_err());
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(Path::new("/tmp/a \"b\".step")), "\"/tmp/a \\\"b\\\".step\"");
    }

    #[test]
    fn test_missing_binary_reports_not_installed() {
        let mut engine = GmshCli::new("ladder-no-such-gmsh-binary");
        let err = engine.query_version().unwrap_err();
        assert!(matches!(err, EngineError::NotInstalled(_)));
    }

    #[test]
    fn test_calls_without_session_fail() {
        let mut engine = GmshCli::new("gmsh");
        assert!(matches!(engine.add_model("m"), Err(EngineError::NoSession)));
        assert!(matches!(engine.entity_name(3, 1), Err(EngineError::NoSession)));
    }

    #[test]
    fn test_session_records_script_and_cleans_up() {
        let mut engine = GmshCli::new("gmsh");
        engine.initialize().unwrap();
        engine.set_number(GENERAL_TERMINAL, 0.0).unwrap();
        engine.add_model("info").unwrap();
        engine.set_number("Mesh.Algorithm", 6.0).unwrap();

        let scratch = engine.session().unwrap().scratch.path().to_path_buf();
        assert!(scratch.is_dir());
        assert_eq!(
            engine.session().unwrap().lines,
            vec!["// model info".to_string(), "Mesh.Algorithm = 6;".to_string()]
        );

        engine.finalize();
        assert!(!scratch.exists());
        // Finalizing twice is harmless
        engine.finalize();
    }

    #[test]
    fn test_import_missing_file_is_not_found() {
        let mut engine = GmshCli::new("gmsh");
        engine.initialize().unwrap();
        let err = engine
            .import_shapes(Path::new("/nonexistent/part.step"))
            .unwrap_err();
        match err {
            EngineError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other:?}"),
        }
        engine.finalize();
    }

    #[test]
    fn test_step_names_assigned_to_volumes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assembly.step");
        std::fs::write(&path, "#1=PRODUCT('Base','','',(#2));\n#3=PRODUCT('Lid','','',(#2));\n").unwrap();

        let mut engine = GmshCli::new("gmsh");
        engine.initialize().unwrap();
        engine.import_shapes(&path).unwrap();

        assert_eq!(engine.entity_name(3, 1).unwrap(), "Base");
        assert_eq!(engine.entity_name(3, 2).unwrap(), "Lid");
        assert_eq!(engine.entity_name(3, 3).unwrap(), "");
        assert_eq!(engine.entity_name(2, 1).unwrap(), "");
        engine.finalize();
    }

    #[test]
    fn test_write_without_mesh_fails() {
        let mut engine = GmshCli::new("gmsh");
        engine.initialize().unwrap();
        assert!(engine.write(Path::new("/tmp/out.stl")).is_err());
        engine.finalize();
    }
}
