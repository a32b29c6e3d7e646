// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Approximate in-memory footprint of JSON-shaped values.
//!
//! The estimate is what buffer accounting runs on, not a serialized byte count:
//!
//! - null: 0
//! - boolean: 4
//! - number: 8
//! - string: 2 bytes per UTF-16 code unit
//! - object: sum of `size(key) + size(value)` over its fields
//! - array: sum of `size(index as string) + size(element)` over its elements

use serde::Serialize;
use serde_json::Value;

const BOOL_SIZE: usize = 4;
const NUMBER_SIZE: usize = 8;
const BYTES_PER_CHAR: usize = 2;

#[must_use]
pub fn estimate_size(value: &Value) -> usize {
    match value {
        Value::Null => 0,
        Value::Bool(_) => BOOL_SIZE,
        Value::Number(_) => NUMBER_SIZE,
        Value::String(s) => string_size(s),
        Value::Array(elements) => elements
            .iter()
            .enumerate()
            .map(|(index, element)| index_key_size(index) + estimate_size(element))
            .sum(),
        Value::Object(fields) => fields
            .iter()
            .map(|(key, value)| string_size(key) + estimate_size(value))
            .sum(),
    }
}

/// Estimates any serializable value through its JSON shape.
///
/// Returns `None` if the value cannot be represented as JSON.
pub fn estimate_serialized<T: Serialize>(value: &T) -> Option<usize> {
    serde_json::to_value(value).ok().map(|v| estimate_size(&v))
}

/// Cost of the key an array element carries at `index`.
#[must_use]
pub fn index_key_size(index: usize) -> usize {
    decimal_digits(index) * BYTES_PER_CHAR
}

fn string_size(s: &str) -> usize {
    s.encode_utf16().count() * BYTES_PER_CHAR
}

fn decimal_digits(mut n: usize) -> usize {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}
