mod n25q;

pub use n25q::{N25Q, N25Q032, N25Q064, N25Q128};
