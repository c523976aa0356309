//! Drivers command - list the registered drivers in selection order.

use anyhow::Result;
use console::style;
use tagpack::DriverRegistry;

pub fn execute() -> Result<i32> {
    let registry = DriverRegistry::default();

    for (position, key) in registry.keys().enumerate() {
        println!("{:>2}. {}", position + 1, style(key).green());
    }

    Ok(0)
}
