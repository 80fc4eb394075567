pub mod fx_rate;
