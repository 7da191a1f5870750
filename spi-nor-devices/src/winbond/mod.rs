mod w25q;

pub use w25q::{W25Q, W25Q128, W25Q32, W25Q64};
