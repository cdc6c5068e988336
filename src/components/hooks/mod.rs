pub mod use_threshold_signals;
