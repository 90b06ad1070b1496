mod tests_lexer;
mod tests_recovery;
mod tests_scenarios;
mod tests_table;
