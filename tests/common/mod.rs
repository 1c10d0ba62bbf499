//! Test fixtures: a tiny fixed-weight ONNX model written with a minimal
//! protobuf encoder.
//!
//! The model takes the three particle transformer inputs
//! `pf_features (N, 17, L)`, `pf_vectors (N, 4, L)` and `pf_mask (N, 1, L)`
//! and declares two outputs:
//! - `output (N, 22)`: every channel summed over its slots, concatenated
//!   in input order;
//! - `mask_count (N)`: the number of occupied mask slots.
//!
//! A variant declares `mask_count` as `(1)` to check that output templates
//! get the batch sentinel regardless of the artifact.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub const FEATURE_CHANNELS: i64 = 17;
pub const VECTOR_CHANNELS: i64 = 4;
pub const MASK_CHANNELS: i64 = 1;
pub const OUTPUT_LEN: usize = (FEATURE_CHANNELS + VECTOR_CHANNELS + MASK_CHANNELS) as usize;

const ONNX_FLOAT: i64 = 1;
const ATTRIBUTE_INT: i64 = 2;
const ATTRIBUTE_INTS: i64 = 7;

fn varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

fn key(buf: &mut Vec<u8>, field: u64, wire_type: u64) {
    varint(buf, (field << 3) | wire_type);
}

fn int_field(buf: &mut Vec<u8>, field: u64, value: i64) {
    key(buf, field, 0);
    varint(buf, value as u64);
}

fn bytes_field(buf: &mut Vec<u8>, field: u64, bytes: &[u8]) {
    key(buf, field, 2);
    varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

fn string_field(buf: &mut Vec<u8>, field: u64, value: &str) {
    bytes_field(buf, field, value.as_bytes());
}

enum Dim {
    Batch,
    Fixed(i64),
}

fn value_info(name: &str, dims: &[Dim]) -> Vec<u8> {
    let mut shape = Vec::new();
    for dim in dims {
        let mut d = Vec::new();
        match dim {
            Dim::Batch => string_field(&mut d, 2, "N"),
            Dim::Fixed(v) => int_field(&mut d, 1, *v),
        }
        bytes_field(&mut shape, 1, &d);
    }

    let mut tensor_type = Vec::new();
    int_field(&mut tensor_type, 1, ONNX_FLOAT);
    bytes_field(&mut tensor_type, 2, &shape);

    let mut type_proto = Vec::new();
    bytes_field(&mut type_proto, 1, &tensor_type);

    let mut info = Vec::new();
    string_field(&mut info, 1, name);
    bytes_field(&mut info, 2, &type_proto);
    info
}

fn int_attribute(name: &str, value: i64) -> Vec<u8> {
    let mut attr = Vec::new();
    string_field(&mut attr, 1, name);
    int_field(&mut attr, 3, value);
    int_field(&mut attr, 20, ATTRIBUTE_INT);
    attr
}

fn ints_attribute(name: &str, values: &[i64]) -> Vec<u8> {
    let mut attr = Vec::new();
    string_field(&mut attr, 1, name);
    for &v in values {
        int_field(&mut attr, 8, v);
    }
    int_field(&mut attr, 20, ATTRIBUTE_INTS);
    attr
}

fn node(op_type: &str, name: &str, inputs: &[&str], outputs: &[&str], attributes: &[Vec<u8>]) -> Vec<u8> {
    let mut node = Vec::new();
    for input in inputs {
        string_field(&mut node, 1, input);
    }
    for output in outputs {
        string_field(&mut node, 2, output);
    }
    string_field(&mut node, 3, name);
    string_field(&mut node, 4, op_type);
    for attr in attributes {
        bytes_field(&mut node, 5, attr);
    }
    node
}

fn reduce_sum(name: &str, input: &str, output: &str, axes: &[i64]) -> Vec<u8> {
    node(
        "ReduceSum",
        name,
        &[input],
        &[output],
        &[ints_attribute("axes", axes), int_attribute("keepdims", 0)],
    )
}

/// Serialized ONNX model for `slot_length` particle slots.
pub fn channel_sum_model(slot_length: i64) -> Vec<u8> {
    build_model(slot_length, Dim::Batch)
}

/// Same graph, but `mask_count` is declared with a fixed leading dimension
/// of 1 instead of the symbolic batch size.
pub fn fixed_batch_model(slot_length: i64) -> Vec<u8> {
    build_model(slot_length, Dim::Fixed(1))
}

fn build_model(slot_length: i64, mask_count_batch: Dim) -> Vec<u8> {
    let mut graph = Vec::new();
    for n in [
        reduce_sum("sum_features", "pf_features", "feature_sums", &[2]),
        reduce_sum("sum_vectors", "pf_vectors", "vector_sums", &[2]),
        reduce_sum("sum_mask", "pf_mask", "mask_sums", &[2]),
        node(
            "Concat",
            "concat",
            &["feature_sums", "vector_sums", "mask_sums"],
            &["output"],
            &[int_attribute("axis", 1)],
        ),
        reduce_sum("count_mask", "pf_mask", "mask_count", &[1, 2]),
    ] {
        bytes_field(&mut graph, 1, &n);
    }
    string_field(&mut graph, 2, "channel_sums");

    for (name, channels) in [
        ("pf_features", FEATURE_CHANNELS),
        ("pf_vectors", VECTOR_CHANNELS),
        ("pf_mask", MASK_CHANNELS),
    ] {
        let info = value_info(name, &[Dim::Batch, Dim::Fixed(channels), Dim::Fixed(slot_length)]);
        bytes_field(&mut graph, 11, &info);
    }
    bytes_field(
        &mut graph,
        12,
        &value_info("output", &[Dim::Batch, Dim::Fixed(OUTPUT_LEN as i64)]),
    );
    bytes_field(&mut graph, 12, &value_info("mask_count", &[mask_count_batch]));

    let mut opset = Vec::new();
    string_field(&mut opset, 1, "");
    int_field(&mut opset, 2, 11);

    let mut model = Vec::new();
    int_field(&mut model, 1, 7);
    string_field(&mut model, 2, "jet-tagger-tests");
    bytes_field(&mut model, 7, &graph);
    bytes_field(&mut model, 8, &opset);
    model
}

/// Writes the channel-sum model into `dir` and returns its path.
pub fn write_channel_sum_model(dir: &Path, slot_length: i64) -> PathBuf {
    let path = dir.join("channel_sums.onnx");
    std::fs::write(&path, channel_sum_model(slot_length)).expect("write test model");
    path
}

/// Writes the fixed-batch variant into `dir` and returns its path.
pub fn write_fixed_batch_model(dir: &Path, slot_length: i64) -> PathBuf {
    let path = dir.join("channel_sums_fixed.onnx");
    std::fs::write(&path, fixed_batch_model(slot_length)).expect("write test model");
    path
}

/// Path of a file under `tests/data`.
pub fn data_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}
