//! Analysis of colours and optimized grids for reporting

/// Colour bookkeeping between RGBA values and colour indices
pub mod palette;
/// Summary statistics of a pattern grid
pub mod statistics;
