use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use anyhow::{Context, Result};
use polars::prelude::*;

/// Row-label column carried alongside the table columns.
const INDEX: &str = "index";

// ---------------------------------------------------------------------------
// Species – categorical label derived from the class index
// ---------------------------------------------------------------------------

/// The three Iris species. `Ord` follows the class index, which is also the
/// alphabetical order of the names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Species {
    Setosa,
    Versicolor,
    Virginica,
}

impl Species {
    pub const ALL: [Species; 3] = [Species::Setosa, Species::Versicolor, Species::Virginica];

    /// Map a numeric class index to its species. Unknown indices have no label.
    pub fn from_target(target: i64) -> Option<Self> {
        usize::try_from(target)
            .ok()
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Species::Setosa => "setosa",
            Species::Versicolor => "versicolor",
            Species::Virginica => "virginica",
        }
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Column – the fixed table schema
// ---------------------------------------------------------------------------

/// Columns of the table, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    SepalLength,
    SepalWidth,
    PetalLength,
    PetalWidth,
    Target,
    Species,
}

impl Column {
    pub const ALL: [Column; 6] = [
        Column::SepalLength,
        Column::SepalWidth,
        Column::PetalLength,
        Column::PetalWidth,
        Column::Target,
        Column::Species,
    ];

    /// Columns that take part in summary statistics and grouped means.
    pub const NUMERIC: [Column; 5] = [
        Column::SepalLength,
        Column::SepalWidth,
        Column::PetalLength,
        Column::PetalWidth,
        Column::Target,
    ];

    /// The four flower measurements, in source file order.
    pub const MEASUREMENTS: [Column; 4] = [
        Column::SepalLength,
        Column::SepalWidth,
        Column::PetalLength,
        Column::PetalWidth,
    ];

    /// Header name as it appears in data files and reports.
    pub fn name(self) -> &'static str {
        match self {
            Column::SepalLength => "sepal length (cm)",
            Column::SepalWidth => "sepal width (cm)",
            Column::PetalLength => "petal length (cm)",
            Column::PetalWidth => "petal width (cm)",
            Column::Target => "target",
            Column::Species => "species",
        }
    }

    /// Storage type, named the way dataframe libraries report it.
    pub fn dtype(self) -> &'static str {
        match self {
            Column::Target => "int64",
            Column::Species => "object",
            _ => "float64",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Record – one row of the table
// ---------------------------------------------------------------------------

/// A single flower observation. Any cell may be missing.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Row label assigned at load time; survives filtering.
    pub index: usize,
    pub sepal_length: Option<f64>,
    pub sepal_width: Option<f64>,
    pub petal_length: Option<f64>,
    pub petal_width: Option<f64>,
    pub target: Option<i64>,
    /// Derived from `target`; never read from input.
    pub species: Option<Species>,
}

impl Record {
    pub fn new(index: usize, measurements: [Option<f64>; 4], target: Option<i64>) -> Self {
        let [sepal_length, sepal_width, petal_length, petal_width] = measurements;
        Record {
            index,
            sepal_length,
            sepal_width,
            petal_length,
            petal_width,
            target,
            species: target.and_then(Species::from_target),
        }
    }

    /// Numeric value of a column, `None` when missing or non-numeric.
    pub fn numeric(&self, column: Column) -> Option<f64> {
        match column {
            Column::SepalLength => self.sepal_length,
            Column::SepalWidth => self.sepal_width,
            Column::PetalLength => self.petal_length,
            Column::PetalWidth => self.petal_width,
            Column::Target => self.target.map(|t| t as f64),
            Column::Species => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Summary – the `describe` row set
// ---------------------------------------------------------------------------

/// Count, moments and order statistics of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (`ddof = 1`).
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

impl Summary {
    /// Row labels, in the order [`Summary::values`] returns them.
    pub const LABELS: [&'static str; 8] =
        ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

    pub fn values(&self) -> [f64; 8] {
        [
            self.count as f64,
            self.mean,
            self.std,
            self.min,
            self.q25,
            self.q50,
            self.q75,
            self.max,
        ]
    }
}

// ---------------------------------------------------------------------------
// Dataset – the loaded table, backed by a polars DataFrame
// ---------------------------------------------------------------------------

/// The full table, in load order, plus a row-label column.
#[derive(Debug, Clone)]
pub struct Dataset {
    frame: DataFrame,
}

impl Dataset {
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let mut columns: Vec<polars::prelude::Column> = vec![Series::new(
            INDEX.into(),
            records.iter().map(|r| r.index as u64).collect::<Vec<u64>>(),
        )
        .into()];
        for col in Column::MEASUREMENTS {
            let values: Vec<Option<f64>> = records.iter().map(|r| r.numeric(col)).collect();
            columns.push(Series::new(col.name().into(), values).into());
        }
        let targets: Vec<Option<i64>> = records.iter().map(|r| r.target).collect();
        columns.push(Series::new(Column::Target.name().into(), targets).into());
        let species: Vec<Option<&str>> = records
            .iter()
            .map(|r| r.species.map(Species::name))
            .collect();
        columns.push(Series::new(Column::Species.name().into(), species).into());

        let frame = DataFrame::new(columns).context("building dataset frame")?;
        Ok(Dataset { frame })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.frame.height()
    }

    /// Materialize the table as rows.
    pub fn records(&self) -> Result<Vec<Record>> {
        let index = self.series(INDEX)?.cast(&DataType::UInt64)?;
        let index: Vec<Option<u64>> = index.u64()?.into_iter().collect();
        let measurements = Column::MEASUREMENTS
            .iter()
            .map(|&c| self.optional_values(c))
            .collect::<Result<Vec<_>>>()?;
        let targets = self.series(Column::Target.name())?.cast(&DataType::Int64)?;
        let targets: Vec<Option<i64>> = targets.i64()?.into_iter().collect();

        Ok((0..self.len())
            .map(|row| {
                let label = index[row].map_or(row, |i| i as usize);
                let cells = [
                    measurements[0][row],
                    measurements[1][row],
                    measurements[2][row],
                    measurements[3][row],
                ];
                Record::new(label, cells, targets[row])
            })
            .collect())
    }

    /// The first `n` rows (fewer if the table is shorter).
    pub fn head(&self, n: usize) -> Result<Vec<Record>> {
        Dataset {
            frame: self.frame.head(Some(n)),
        }
        .records()
    }

    /// Missing-value count for every column, in column order.
    pub fn null_counts(&self) -> Result<Vec<(Column, usize)>> {
        Column::ALL
            .iter()
            .map(|&c| -> Result<(Column, usize)> {
                Ok((c, self.frame.column(c.name())?.null_count()))
            })
            .collect()
    }

    pub fn has_nulls(&self) -> bool {
        self.frame.get_columns().iter().any(|c| c.null_count() > 0)
    }

    /// Drop every row with at least one missing cell. Returns the cleaned
    /// table and the number of rows removed.
    pub fn drop_nulls(self) -> Result<(Dataset, usize)> {
        let before = self.frame.height();
        let frame = self
            .frame
            .lazy()
            .drop_nulls(None)
            .collect()
            .context("dropping incomplete rows")?;
        let removed = before - frame.height();
        Ok((Dataset { frame }, removed))
    }

    /// Non-missing values of a numeric column, in row order.
    pub fn column(&self, column: Column) -> Result<Vec<f64>> {
        Ok(self.optional_values(column)?.into_iter().flatten().collect())
    }

    /// Non-missing values of a column restricted to one species.
    pub fn species_column(&self, species: Species, column: Column) -> Result<Vec<f64>> {
        let frame = self
            .frame
            .clone()
            .lazy()
            .filter(col(Column::Species.name()).eq(lit(species.name())))
            .collect()?;
        Dataset { frame }.column(column)
    }

    /// Distinct species labels present, sorted.
    pub fn species(&self) -> Result<BTreeSet<Species>> {
        let labels = self.series(Column::Species.name())?.str()?;
        Ok(labels.into_iter().flatten().filter_map(Species::from_name).collect())
    }

    /// `(row label, running total)` of a numeric column, skipping missing cells.
    pub fn cumulative_sum(&self, column: Column) -> Result<Vec<(usize, f64)>> {
        let name = column.name();
        let totals = self
            .frame
            .clone()
            .lazy()
            .filter(col(name).is_not_null())
            .select([
                col(INDEX),
                col(name).cast(DataType::Float64).cum_sum(false).alias(name),
            ])
            .collect()
            .with_context(|| format!("cumulative sum of '{name}'"))?;

        let index = totals.column(INDEX)?.as_materialized_series().u64()?;
        let sums = totals.column(name)?.as_materialized_series().f64()?;
        Ok(index
            .into_iter()
            .zip(sums)
            .filter_map(|(i, v)| Some((i? as usize, v?)))
            .collect())
    }

    /// Summary statistics for every numeric column that has at least one value.
    pub fn describe(&self) -> Result<Vec<(Column, Summary)>> {
        let mut out = Vec::new();
        for column in Column::NUMERIC {
            let series = self.series(column.name())?.cast(&DataType::Float64)?;
            let ca = series.f64()?;
            let count = ca.len() - ca.null_count();
            if count == 0 {
                continue;
            }
            out.push((
                column,
                Summary {
                    count,
                    mean: ca.mean().unwrap_or(f64::NAN),
                    std: ca.std(1).unwrap_or(f64::NAN),
                    min: ca.min().unwrap_or(f64::NAN),
                    q25: ca.quantile(0.25, QuantileMethod::Linear)?.unwrap_or(f64::NAN),
                    q50: ca.median().unwrap_or(f64::NAN),
                    q75: ca.quantile(0.75, QuantileMethod::Linear)?.unwrap_or(f64::NAN),
                    max: ca.max().unwrap_or(f64::NAN),
                },
            ));
        }
        Ok(out)
    }

    /// Mean of every numeric column per species. Rows without a species
    /// label are left out of the grouping.
    pub fn group_means(&self) -> Result<BTreeMap<Species, Vec<(Column, Option<f64>)>>> {
        let species_col = Column::Species.name();
        let aggs: Vec<Expr> = Column::NUMERIC
            .iter()
            .map(|c| col(c.name()).cast(DataType::Float64).mean())
            .collect();
        let grouped = self
            .frame
            .clone()
            .lazy()
            .filter(col(species_col).is_not_null())
            .group_by([col(species_col)])
            .agg(aggs)
            .collect()
            .context("grouping by species")?;

        let labels = grouped.column(species_col)?.as_materialized_series().str()?;
        let mut means = BTreeMap::new();
        for (row, label) in labels.into_iter().enumerate() {
            let Some(species) = label.and_then(Species::from_name) else {
                continue;
            };
            let row_means = Column::NUMERIC
                .iter()
                .map(|&c| -> Result<(Column, Option<f64>)> {
                    let ca = grouped.column(c.name())?.as_materialized_series().f64()?;
                    Ok((c, ca.get(row)))
                })
                .collect::<Result<Vec<_>>>()?;
            means.insert(species, row_means);
        }
        Ok(means)
    }

    fn series(&self, name: &str) -> Result<&Series> {
        Ok(self.frame.column(name)?.as_materialized_series())
    }

    fn optional_values(&self, column: Column) -> Result<Vec<Option<f64>>> {
        let series = self.series(column.name())?.cast(&DataType::Float64)?;
        Ok(series.f64()?.into_iter().collect())
    }
}
