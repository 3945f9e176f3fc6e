// Panic message extraction for worker isolation
use std::any::Any;

/// Render a caught panic payload as text
///
/// `panic!("literal")` carries a `&str`, formatted panics carry a `String`;
/// anything else is reported generically.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
