pub mod fx_rates_job;
