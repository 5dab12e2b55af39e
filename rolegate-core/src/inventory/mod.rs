pub mod scanner;

pub use scanner::{InventoryScanner, ScanConfig, ScanObserver};
