mod decomposition;

pub use decomposition::DecompositionColumn;
