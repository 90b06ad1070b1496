mod tests_concurrency;
mod tests_properties;
