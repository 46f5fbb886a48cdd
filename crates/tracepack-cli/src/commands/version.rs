use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tracepack_core::version::version_string;
use tracepack_core::{CLOSURE_SCHEMA_VERSION, VERSION};

#[derive(Serialize)]
struct VersionJson {
    version: &'static str,
    schema_version: u32,
}

pub fn run(json: bool) -> Result<()> {
    if json {
        let out = VersionJson {
            version: VERSION,
            schema_version: CLOSURE_SCHEMA_VERSION,
        };
        println!("{}", serde_json::to_string(&out).into_diagnostic()?);
    } else {
        println!("{}", version_string());
    }
    Ok(())
}
