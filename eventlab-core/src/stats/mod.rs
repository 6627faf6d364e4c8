//! Statistics shared by the single-event and aggregate engines.

pub mod descriptive;
pub mod student_t;

pub use descriptive::{cumulative_sum, mean, population_variance, quantile, Summary};
pub use student_t::{significance, t_quantile, t_statistic, upper_tail_p_value};
