//! Mock implementations of the analyzer seam.
