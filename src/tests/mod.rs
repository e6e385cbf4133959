mod test_scenarios;
mod test_from_yaml;
