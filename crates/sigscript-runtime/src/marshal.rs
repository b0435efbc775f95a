//! Conversion between host JSON values and interpreter objects.
//!
//! Keyword arguments travel host → runtime as JSON; parameter defaults and
//! (for hosts that ask for it) call results travel back the same way.
//! Objects without a JSON shape come back as their `repr()`.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyComplex, PyDict, PyFloat, PyInt, PyList, PyString, PyTuple};
use serde_json::{Map, Number, Value};

/// Keyword arguments supplied by the host at invocation time.
pub type Kwargs = Map<String, Value>;

/// Deepest container nesting `py_to_json` will follow.
pub const MAX_DEPTH: usize = 256;

pub fn json_to_py<'py>(py: Python<'py>, value: &Value) -> PyResult<Bound<'py, PyAny>> {
    Ok(match value {
        Value::Null => py.None().into_bound(py),
        Value::Bool(b) => PyBool::new(py, *b).to_owned().into_any(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.into_pyobject(py)?.into_any()
            } else if let Some(u) = n.as_u64() {
                u.into_pyobject(py)?.into_any()
            } else {
                PyFloat::new(py, n.as_f64().unwrap_or(f64::NAN)).into_any()
            }
        }
        Value::String(s) => PyString::new(py, s).into_any(),
        Value::Array(items) => {
            let items = items
                .iter()
                .map(|item| json_to_py(py, item))
                .collect::<PyResult<Vec<_>>>()?;
            PyList::new(py, items)?.into_any()
        }
        Value::Object(map) => kwargs_to_dict(py, map)?.into_any(),
    })
}

pub fn kwargs_to_dict<'py>(py: Python<'py>, kwargs: &Kwargs) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for (key, value) in kwargs {
        dict.set_item(key, json_to_py(py, value)?)?;
    }
    Ok(dict)
}

/// Convert an interpreter object to JSON.
///
/// Self-referencing containers and nesting beyond [`MAX_DEPTH`] are
/// reported as `ValueError` instead of being followed.
pub fn py_to_json(value: &Bound<'_, PyAny>) -> PyResult<Value> {
    let mut ancestors = Vec::new();
    convert(value, &mut ancestors)
}

/// `ancestors` holds the containers currently being converted, outermost first.
fn convert(value: &Bound<'_, PyAny>, ancestors: &mut Vec<usize>) -> PyResult<Value> {
    if value.is_none() {
        return Ok(Value::Null);
    }
    if value.is_instance_of::<PyBool>() {
        return Ok(Value::Bool(value.extract::<bool>()?));
    }
    if value.is_instance_of::<PyInt>() {
        if let Ok(i) = value.extract::<i64>() {
            return Ok(Value::from(i));
        }
        if let Ok(u) = value.extract::<u64>() {
            return Ok(Value::from(u));
        }
        // beyond 64 bits
        return Ok(Value::String(value.str()?.to_string()));
    }
    if value.is_instance_of::<PyFloat>() {
        return Ok(float(value.extract::<f64>()?));
    }
    if value.is_instance_of::<PyString>() {
        return Ok(Value::String(value.extract::<String>()?));
    }
    if value.is_instance_of::<PyComplex>() {
        let re = value.getattr("real")?.extract::<f64>()?;
        let im = value.getattr("imag")?.extract::<f64>()?;
        return Ok(Value::Array(vec![float(re), float(im)]));
    }
    if value.is_instance_of::<PyList>() || value.is_instance_of::<PyTuple>() {
        enter(value, ancestors)?;
        let items = value
            .try_iter()?
            .map(|item| convert(&item?, ancestors))
            .collect::<PyResult<Vec<_>>>();
        ancestors.pop();
        return Ok(Value::Array(items?));
    }
    if value.is_instance_of::<PyDict>() {
        enter(value, ancestors)?;
        let map = dict_entries(value, ancestors);
        ancestors.pop();
        return Ok(Value::Object(map?));
    }
    // numpy arrays and scalars
    if value.hasattr("tolist")? {
        let native = value.call_method0("tolist")?;
        if !native.hasattr("tolist")? {
            return convert(&native, ancestors);
        }
    }
    Ok(Value::String(value.repr()?.to_string()))
}

fn enter(container: &Bound<'_, PyAny>, ancestors: &mut Vec<usize>) -> PyResult<()> {
    let id = container.as_ptr() as usize;
    if ancestors.contains(&id) {
        return Err(PyValueError::new_err("circular reference in result"));
    }
    if ancestors.len() >= MAX_DEPTH {
        return Err(PyValueError::new_err(format!(
            "result nested deeper than {MAX_DEPTH} levels"
        )));
    }
    ancestors.push(id);
    Ok(())
}

fn dict_entries(
    dict: &Bound<'_, PyAny>,
    ancestors: &mut Vec<usize>,
) -> PyResult<Map<String, Value>> {
    let mut map = Map::new();
    for item in dict.call_method0("items")?.try_iter()? {
        let item = item?;
        let key = item.get_item(0)?;
        let key = match key.extract::<String>() {
            Ok(s) => s,
            Err(_) => key.str()?.to_string(),
        };
        map.insert(key, convert(&item.get_item(1)?, ancestors)?);
    }
    Ok(map)
}

fn float(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}
