use serde::Serialize;

use crate::model::Error;

pub fn to_json<T: Serialize>(value: &T) -> Result<String, Error> {
    serde_json::to_string(value)
        .map_err(|e| Error::Internal(format!("cannot serialize output: {e}")))
}

#[cfg(feature = "python")]
pub fn register_submodule(
    py: pyo3::Python<'_>,
    parent: &pyo3::Bound<'_, pyo3::types::PyModule>,
    child: &pyo3::Bound<'_, pyo3::types::PyModule>,
    parent_name: &str,
) -> pyo3::PyResult<()> {
    use pyo3::prelude::*;

    parent.add_submodule(child)?;
    let full_name = format!("{}.{}", parent_name, child.name()?);
    py.import("sys")?
        .getattr("modules")?
        .set_item(full_name, child)?;
    Ok(())
}
