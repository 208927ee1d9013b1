/**
 * This module contains all logic for loading texture assets from external files.
 */
pub mod texture;

use crate::render::Material;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let location = window.location();
    let origin = location
        .origin()
        .map_err(|_| anyhow::anyhow!("no origin"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        std::fs::read(path)?
    };

    Ok(data)
}

pub async fn load_texture(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> anyhow::Result<texture::Texture> {
    let data = load_binary(file_name).await?;
    let format = file_name.rsplit('.').next();
    texture::Texture::from_bytes(device, queue, &data, file_name, format)
}

/// Load a diffuse texture and wrap it in a bind group ready for drawing.
///
/// A missing or unreadable image is not fatal: the material falls back to a
/// plain white diffuse so the body still renders, just untextured.
pub async fn load_material(
    file_name: &str,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
) -> Material {
    let diffuse = match load_texture(file_name, device, queue).await {
        Ok(diffuse) => diffuse,
        Err(error) => {
            log::warn!("Texture {file_name} could not be loaded ({error}), using plain white.");
            texture::Texture::create_solid_diffuse(device, queue, [255; 4], file_name)
        }
    };
    Material::new(device, file_name, diffuse, layout)
}
