pub mod mindicador_client;

pub use mindicador_client::{MindicadorClient, RatesApi};

#[cfg(test)]
pub use mindicador_client::MockRatesApi;
