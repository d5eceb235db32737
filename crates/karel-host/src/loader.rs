//! Code unit loading.
//!
//! A program is one primary Lua file plus any sibling units it pulls in
//! through `require()`. Every load builds a completely fresh VM; nothing
//! from an earlier load survives, which is what makes edit-and-rerun
//! work without restarting the host.
//!
//! # Module resolution
//!
//! `require("helper")` resolves against the program file's directory:
//! `{dir}/helper.lua`, then `{dir}/helper/init.lua`. Host-internal code is
//! never on the search path, so a program cannot load (or re-execute) host
//! infrastructure. Each unit's chunk is named after its file, so traceback
//! frames carry the unit identity the supervisor filters on.

use crate::bind;
use crate::error::HostError;
use crate::{SharedView, SharedWorld};
use mlua::{Function, Lua, RegistryKey, Table, Value};
use std::path::{Path, PathBuf};

/// Loads learner programs against a shared world.
///
/// The world is needed at load time because the raw capability pass is
/// bound before the primary chunk executes, so top-level capability calls
/// resolve.
pub struct ProgramLoader {
    world: SharedWorld,
}

impl ProgramLoader {
    #[must_use]
    pub fn new(world: SharedWorld) -> Self {
        Self { world }
    }

    /// Loads the program at `path`.
    ///
    /// # Errors
    ///
    /// - [`HostError::NotFound`] if `path` is not an existing file.
    /// - [`HostError::SyntaxFailure`] if the primary or a required unit
    ///   fails to parse.
    /// - [`HostError::MissingEntryPoint`] if no global `main` function
    ///   exists after the primary unit runs.
    pub fn load(&self, path: &Path) -> Result<LoadedProgram, HostError> {
        if !path.is_file() {
            return Err(HostError::NotFound(path.display().to_string()));
        }
        let source = std::fs::read_to_string(path)
            .map_err(|_| HostError::NotFound(path.display().to_string()))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "program".to_string());
        let unit = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{name}.lua"));

        let lua = Lua::new();
        setup_require(&lua, path.parent().map(Path::to_path_buf))
            .map_err(HostError::Engine)?;

        // Raw pass first, so the vocabulary resolves during top-level
        // execution of the chunk.
        bind::bind_raw(&lua, &self.world).map_err(HostError::Engine)?;

        lua.load(&source)
            .set_name(format!("@{unit}"))
            .exec()
            .map_err(load_failure)?;

        let main: Value = lua.globals().raw_get("main").map_err(HostError::Engine)?;
        let Value::Function(main) = main else {
            return Err(HostError::MissingEntryPoint);
        };
        let entry_key = lua.create_registry_value(main).map_err(HostError::Engine)?;

        tracing::debug!(program = %name, "loaded program");
        Ok(LoadedProgram {
            name,
            unit,
            source,
            lua,
            entry_key,
        })
    }
}

/// A loaded program: the primary unit plus whatever it required, hosted
/// in its own Lua VM.
///
/// Never mutated across runs; a reload produces an entirely new value.
#[derive(Debug)]
pub struct LoadedProgram {
    name: String,
    unit: String,
    source: String,
    lua: Lua,
    entry_key: RegistryKey,
}

impl LoadedProgram {
    /// Program identifier, derived from the primary file's stem.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Primary unit identity as it appears in traceback frames
    /// (the file name, e.g. `hurdles.lua`).
    #[must_use]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// The primary unit's source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// One source line, 1-based, for diagnostic display.
    #[must_use]
    pub fn source_line(&self, line: usize) -> Option<&str> {
        self.source.lines().nth(line.checked_sub(1)?)
    }

    /// The hosted VM. Exposed for tests and the supervisor.
    #[must_use]
    pub fn lua(&self) -> &Lua {
        &self.lua
    }

    /// The interception pass: re-asserts the full vocabulary (replacing
    /// any reserved-name definitions the program made), rebinds mutators
    /// to intercepted variants, and arms strict globals.
    ///
    /// # Errors
    ///
    /// Returns an engine error if binding fails.
    pub fn bind(&self, world: &SharedWorld, view: &SharedView) -> Result<(), HostError> {
        bind::bind_raw(&self.lua, world)?;
        bind::bind_intercepted(&self.lua, world, view)?;
        bind::install_strict_globals(&self.lua)?;
        Ok(())
    }

    /// The `main` entry point.
    ///
    /// # Errors
    ///
    /// Returns an engine error if the registry value vanished.
    pub fn entry_point(&self) -> Result<Function, mlua::Error> {
        self.lua.registry_value(&self.entry_key)
    }

    /// Names of all global functions currently defined in the VM: the
    /// vocabulary, the program's own definitions, and the Lua stdlib.
    /// Feeds the did-you-mean suggestion.
    #[must_use]
    pub fn defined_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for pair in self.lua.globals().pairs::<String, Value>() {
            let Ok((key, value)) = pair else { continue };
            if matches!(value, Value::Function(_)) {
                names.push(key);
            }
        }
        names.sort();
        names
    }
}

/// Installs a `require()` restricted to the program's own directory.
fn setup_require(lua: &Lua, program_dir: Option<PathBuf>) -> mlua::Result<()> {
    // No default search behavior; everything goes through our resolver.
    let package: Table = lua.globals().get("package")?;
    package.set("path", "")?;
    package.set("cpath", "")?;

    let require = lua.create_function(move |lua, module: String| {
        let package: Table = lua.globals().get("package")?;
        let loaded: Table = package.get("loaded")?;
        if let Ok(cached) = loaded.get::<Value>(module.as_str()) {
            if cached != Value::Nil {
                return Ok(cached);
            }
        }

        let rel = module.replace('.', "/");
        let candidates = match &program_dir {
            Some(dir) => vec![
                dir.join(format!("{rel}.lua")),
                dir.join(&rel).join("init.lua"),
            ],
            None => Vec::new(),
        };

        for candidate in &candidates {
            if !candidate.is_file() {
                continue;
            }
            let source = std::fs::read_to_string(candidate).map_err(|e| {
                mlua::Error::RuntimeError(format!("error reading unit '{module}': {e}"))
            })?;
            let unit = candidate
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("{module}.lua"));
            let result: Value = lua.load(&source).set_name(format!("@{unit}")).eval()?;
            // Units that return nothing still count as loaded.
            let result = if result == Value::Nil {
                Value::Boolean(true)
            } else {
                result
            };
            loaded.set(module.as_str(), result.clone())?;
            return Ok(result);
        }

        Err(mlua::Error::RuntimeError(format!(
            "unit '{module}' not found next to the program file"
        )))
    })?;
    lua.globals().set("require", require)
}

/// Maps a chunk-execution failure at load time into the host taxonomy.
fn load_failure(err: mlua::Error) -> HostError {
    if let Some(message) = find_syntax_error(&err) {
        return HostError::SyntaxFailure(message);
    }
    if let Some(karel) = crate::supervisor::find_domain_error(&err) {
        return HostError::DomainPrecondition(karel);
    }
    HostError::Engine(err)
}

/// Walks the error chain looking for a parse failure (the primary chunk,
/// or a required unit that failed inside a callback).
fn find_syntax_error(err: &mlua::Error) -> Option<String> {
    match err {
        mlua::Error::SyntaxError { message, .. } => Some(message.clone()),
        mlua::Error::CallbackError { cause, .. } => find_syntax_error(cause),
        mlua::Error::WithContext { cause, .. } => find_syntax_error(cause),
        _ => None,
    }
}
