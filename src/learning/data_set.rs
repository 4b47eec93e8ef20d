//! Boolean-function data sets.
//!
//! A data set is a total boolean function over the domain
//! `[0, 2^domain_size)`, viewed as the sequence of its data points. Two
//! representations exist: a closure (`CallableDataSet`) and an explicit value
//! table (`ValuesListDataSet`). Closures are typed `Fn(u64) -> bool`, so only
//! the value-table constructor can observe invalid data and needs to
//! validate.

use super::error::DataSetError;

/// One (input, expected output) pair of a boolean function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DataPoint {
    pub input: u64,
    pub output: bool,
}

/// A total boolean function over a fixed-width binary domain.
pub trait DataSet {
    /// Number of bits needed to represent an input.
    fn domain_size(&self) -> usize;

    /// The function's value at `input`. Inputs are taken modulo the domain
    /// by callers; implementations may assume `input < 2^domain_size`.
    fn value_at(&self, input: u64) -> bool;

    /// Number of data points in the domain.
    fn domain_points(&self) -> u64 {
        1u64 << self.domain_size()
    }

    /// Iterate the whole domain in input order.
    fn points(&self) -> DataSetIter<'_>
    where
        Self: Sized,
    {
        DataSetIter {
            set: self,
            next: 0,
        }
    }
}

/// Ordered iterator over every data point of a set.
pub struct DataSetIter<'a> {
    set: &'a dyn DataSet,
    next: u64,
}

impl Iterator for DataSetIter<'_> {
    type Item = DataPoint;

    fn next(&mut self) -> Option<DataPoint> {
        if self.next >= 1u64 << self.set.domain_size() {
            return None;
        }
        let input = self.next;
        self.next += 1;
        Some(DataPoint {
            input,
            output: self.set.value_at(input),
        })
    }
}

/// A data set defined by a closure, e.g. identity `|x| x == 1` over one bit
/// or parity `|x| x.count_ones() % 2 == 1`.
pub struct CallableDataSet<F: Fn(u64) -> bool> {
    function: F,
    domain_size: usize,
}

impl<F: Fn(u64) -> bool> CallableDataSet<F> {
    pub fn new(function: F, domain_size: usize) -> Self {
        Self {
            function,
            domain_size,
        }
    }
}

impl<F: Fn(u64) -> bool> DataSet for CallableDataSet<F> {
    fn domain_size(&self) -> usize {
        self.domain_size
    }

    fn value_at(&self, input: u64) -> bool {
        (self.function)(input)
    }
}

/// A data set defined by an explicit table of 0/1 return values, one per
/// input. The table length fixes the domain size.
#[derive(Debug)]
pub struct ValuesListDataSet {
    values: Vec<bool>,
    domain_size: usize,
}

impl ValuesListDataSet {
    pub fn new(return_values: &[u8]) -> Result<Self, DataSetError> {
        if !return_values.len().is_power_of_two() {
            return Err(DataSetError::BadLength(return_values.len()));
        }
        let mut values = Vec::with_capacity(return_values.len());
        for (index, &value) in return_values.iter().enumerate() {
            match value {
                0 => values.push(false),
                1 => values.push(true),
                _ => return Err(DataSetError::NotBoolean { index, value }),
            }
        }
        let domain_size = return_values.len().trailing_zeros() as usize;
        Ok(Self {
            values,
            domain_size,
        })
    }
}

impl DataSet for ValuesListDataSet {
    fn domain_size(&self) -> usize {
        self.domain_size
    }

    fn value_at(&self, input: u64) -> bool {
        self.values[input as usize]
    }
}
