#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, Luma};
use vinex::config::{ModelConfig, ModelOutput};
use vinex::denoise::{Activation, ConvLayer, DenoiseModel};

/// Deterministic pseudo-random weights in `[-scale, scale]`.
fn weights(count: usize, seed: u32, scale: f32) -> Vec<f32> {
    let mut state = seed.wrapping_mul(2_654_435_761).max(1);
    (0..count)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state as f32 / u32::MAX as f32 * 2.0 - 1.0) * scale
        })
        .collect()
}

/// Three-layer 1 → 4 → 4 → 1 residual network with small weights.
pub fn tiny_model() -> DenoiseModel {
    let head = ConvLayer::new(1, 4, 3, weights(36, 1, 0.2), Some(vec![0.01; 4]), Activation::Relu)
        .expect("valid head");
    let body = ConvLayer::new(4, 4, 3, weights(144, 2, 0.1), None, Activation::Relu)
        .expect("valid body");
    let tail = ConvLayer::new(4, 1, 3, weights(36, 3, 0.1), None, Activation::None)
        .expect("valid tail");
    DenoiseModel::new(vec![head, body, tail]).expect("valid model")
}

/// Diagonal gradient with a printed-text-like stripe pattern.
pub fn document_image(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let base = 90 + (x + y) % 60;
        let ink = if (y / 4) % 3 == 0 && x % 7 < 4 { 70 } else { 0 };
        Luma([(base - ink) as u8])
    })
}

fn varint(out: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        out.push((value as u8) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

fn int_field(out: &mut Vec<u8>, field: u64, value: u64) {
    varint(out, field << 3);
    varint(out, value);
}

fn bytes_field(out: &mut Vec<u8>, field: u64, bytes: &[u8]) {
    varint(out, (field << 3) | 2);
    varint(out, bytes.len() as u64);
    out.extend_from_slice(bytes);
}

/// `ValueInfoProto` for a float tensor shaped `[1, 1, h, w]`.
fn image_value_info(name: &str) -> Vec<u8> {
    let mut shape = Vec::new();
    for dim in [None, None, Some("h"), Some("w")] {
        let mut d = Vec::new();
        match dim {
            None => int_field(&mut d, 1, 1),
            Some(param) => bytes_field(&mut d, 2, param.as_bytes()),
        }
        bytes_field(&mut shape, 1, &d);
    }
    let mut tensor_type = Vec::new();
    int_field(&mut tensor_type, 1, 1);
    bytes_field(&mut tensor_type, 2, &shape);
    let mut type_proto = Vec::new();
    bytes_field(&mut type_proto, 1, &tensor_type);

    let mut info = Vec::new();
    bytes_field(&mut info, 1, name.as_bytes());
    bytes_field(&mut info, 2, &type_proto);
    info
}

/// Serialized ONNX model computing `output = input - offset`.
pub fn offset_onnx_model(offset: f32) -> Vec<u8> {
    let mut node = Vec::new();
    bytes_field(&mut node, 1, b"input");
    bytes_field(&mut node, 1, b"offset");
    bytes_field(&mut node, 2, b"output");
    bytes_field(&mut node, 3, b"sub");
    bytes_field(&mut node, 4, b"Sub");

    let mut constant = Vec::new();
    int_field(&mut constant, 2, 1);
    bytes_field(&mut constant, 4, &offset.to_le_bytes());
    bytes_field(&mut constant, 8, b"offset");

    let mut graph = Vec::new();
    bytes_field(&mut graph, 1, &node);
    bytes_field(&mut graph, 2, b"offset_denoiser");
    bytes_field(&mut graph, 5, &constant);
    bytes_field(&mut graph, 11, &image_value_info("input"));
    bytes_field(&mut graph, 12, &image_value_info("output"));

    let mut opset = Vec::new();
    bytes_field(&mut opset, 1, b"");
    int_field(&mut opset, 2, 13);

    let mut model = Vec::new();
    int_field(&mut model, 1, 7);
    bytes_field(&mut model, 2, b"vinex-tests");
    bytes_field(&mut model, 7, &graph);
    bytes_field(&mut model, 8, &opset);
    model
}

pub fn write_onnx_model(dir: &Path, offset: f32) -> PathBuf {
    let path = dir.join("model.onnx");
    fs::write(&path, offset_onnx_model(offset)).expect("write model");
    path
}

pub fn model_config(weights: &Path, cache_dir: &Path) -> ModelConfig {
    ModelConfig {
        weights: weights.display().to_string(),
        sha256: None,
        cache_dir: cache_dir.display().to_string(),
        download_timeout_secs: 5,
        output: ModelOutput::Denoised,
        threads: 1,
    }
}
