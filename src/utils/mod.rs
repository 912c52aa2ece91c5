pub mod sanitize;
#[cfg(test)]
pub mod test_utils;
pub mod url;
