#![allow(dead_code)]

pub mod dots;
pub mod synthetic_image;
