use serde::Serialize;

use culinary_compass::application::AppError;

pub fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let out = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Output(e.to_string()))?;
    println!("{out}");
    Ok(())
}
