/**
 * Render pipeline construction and the uniform blocks the shaders consume.
 */
pub mod basic;
pub mod light;
