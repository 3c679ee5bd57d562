pub mod ap;

pub use ap::*;

#[cfg(feature = "python")]
use numpy::ndarray::Array2;
#[cfg(feature = "python")]
use numpy::{IntoPyArray, PyArray2, PyReadonlyArray2};
#[cfg(feature = "python")]
use pyo3::{pymodule, types::PyModule, Bound, PyErr, PyResult, Python};

#[cfg(feature = "python")]
fn to_py_err(err: AprioriError) -> PyErr {
    match err {
        AprioriError::OutOfMemory { .. } => pyo3::exceptions::PyMemoryError::new_err(err.to_string()),
        AprioriError::FileOpen { .. } | AprioriError::FileRead(_) | AprioriError::FileWrite(_) => {
            pyo3::exceptions::PyIOError::new_err(err.to_string())
        }
        other => pyo3::exceptions::PyValueError::new_err(other.to_string()),
    }
}

#[cfg(feature = "python")]
fn dense_config(min_support: f64, min_confidence: f64, max_size: Option<usize>, target: Target) -> MinerConfig {
    MinerConfig {
        target,
        min_support,
        min_confidence,
        max_size,
        ..MinerConfig::default()
    }
}

#[cfg(feature = "python")]
#[pymodule]
fn apriori<'py>(m: &Bound<'py, PyModule>) -> PyResult<()> {
    #[pyfn(m)]
    #[pyo3(name = "apriori", signature = (transactions, min_support, max_size = None))]
    fn apriori_py<'py>(
        py: Python<'py>,
        transactions: PyReadonlyArray2<'py, i32>,
        min_support: f64,
        max_size: Option<usize>,
    ) -> PyResult<Vec<Bound<'py, PyArray2<usize>>>> {
        let config = dense_config(min_support, 1.0, max_size, Target::Sets);
        let levels = match apriori_dense(transactions.as_array(), &config) {
            Ok(levels) => levels,
            Err(err) if err.is_empty_result() => Vec::new(),
            Err(err) => return Err(to_py_err(err)),
        };

        let mut result = Vec::new();
        for level in levels {
            if level.is_empty() {
                continue;
            }
            let itemset_size = level.itemset_size;
            let num_itemsets = level.len();
            let mut data = vec![0usize; num_itemsets * itemset_size];
            for (i, itemset) in level.iter_itemsets().enumerate() {
                for (j, &item) in itemset.iter().enumerate() {
                    data[i * itemset_size + j] = item;
                }
            }
            let array = Array2::from_shape_vec((num_itemsets, itemset_size), data)
                .map_err(|_| pyo3::exceptions::PyValueError::new_err("Failed to create array"))?;
            result.push(array.into_pyarray(py));
        }
        Ok(result)
    }

    #[pyfn(m)]
    #[pyo3(
        name = "association_rules",
        signature = (transactions, min_support, min_confidence, max_size = None)
    )]
    fn association_rules_py<'py>(
        transactions: PyReadonlyArray2<'py, i32>,
        min_support: f64,
        min_confidence: f64,
        max_size: Option<usize>,
    ) -> PyResult<Vec<(Vec<usize>, usize, u64, f64)>> {
        let config = dense_config(min_support, min_confidence, max_size, Target::Rules);
        let rules = match rules_dense(transactions.as_array(), &config) {
            Ok(rules) => rules,
            Err(err) if err.is_empty_result() => Vec::new(),
            Err(err) => return Err(to_py_err(err)),
        };
        Ok(rules
            .into_iter()
            .map(|rule| {
                let confidence = rule.confidence();
                (rule.body, rule.head, rule.support, confidence)
            })
            .collect())
    }

    Ok(())
}
