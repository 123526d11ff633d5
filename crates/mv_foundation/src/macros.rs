// crates/mv_foundation/src/macros.rs

//! 验证宏
//!
//! 提供 `ensure!` 和 `require!` 宏，简化条件检查与 Option 解包。

/// 检查条件，不满足则提前返回错误
///
/// # 示例
///
/// ```
/// use mv_foundation::ensure;
/// use mv_foundation::error::{MvError, MvResult};
///
/// fn validate(n: usize) -> MvResult<()> {
///     ensure!(n > 0, MvError::invalid_parameter("n", n.to_string(), "必须为正数"));
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err);
        }
    };
}

/// 解包 Option，为 None 则提前返回错误
///
/// # 示例
///
/// ```
/// use mv_foundation::require;
/// use mv_foundation::error::{MvError, MvResult};
///
/// fn first(values: &[f64]) -> MvResult<f64> {
///     let v = require!(values.first(), MvError::not_found("first value"));
///     Ok(*v)
/// }
/// ```
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr) => {
        match $opt {
            Some(v) => v,
            None => return Err($err),
        }
    };
}
