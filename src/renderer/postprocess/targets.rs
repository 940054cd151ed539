//! Render target pool: every offscreen surface the pipeline draws into.
//!
//! Surfaces are allocated once at 1x1 and resized in place whenever the
//! viewport changes; nothing is recreated per frame. The bloom mip chain
//! starts at a power-of-two base derived from the physical resolution and
//! halves per level, so blur kernels see stable texel footprints regardless
//! of the window's exact dimensions.

use crate::renderer::DEPTH_FORMAT;

/// Number of progressive blur levels in the bloom mip chain.
pub const MIP_LEVELS: usize = 5;

/// Gaussian kernel diameter per mip level, finest to coarsest.
pub const KERNEL_SIZES: [u32; MIP_LEVELS] = [3, 5, 7, 9, 11];

/// Round up to the nearest power of two in log space: `2^round(log2(x))`.
///
/// Integer-only: `x` rounds up when `x >= floor * sqrt(2)`, i.e. when
/// `x^2 >= 2 * floor^2`.
pub fn nearest_power_of_two(x: u32) -> u32 {
    if x <= 1 {
        return 1;
    }
    let floor = 1_u32 << (31 - x.leading_zeros());
    let x_sq = u64::from(x) * u64::from(x);
    let floor_sq = u64::from(floor) * u64::from(floor);
    if x_sq >= 2 * floor_sq {
        floor * 2
    } else {
        floor
    }
}

/// All pipeline surface dimensions derived from one viewport size.
///
/// Pure data so sizing stays testable without a device: compute once per
/// `resize`, then hand to [`TargetPool::resize`] and the blur passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSizes {
    /// Full-resolution physical pixel size, `round(logical * dpr)`.
    pub physical: (u32, u32),
    /// Bright-extraction size: nearest power of two of each physical axis,
    /// halved.
    pub bloom_base: (u32, u32),
    /// Mip level sizes; level 0 equals `bloom_base`, each following level is
    /// half the previous, clamped to 1x1.
    pub levels: [(u32, u32); MIP_LEVELS],
}

impl PoolSizes {
    /// Compute every surface size for a logical viewport at a pixel ratio.
    pub fn compute(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        let pw = (width * device_pixel_ratio).round().max(1.0) as u32;
        let ph = (height * device_pixel_ratio).round().max(1.0) as u32;

        let base_w = (nearest_power_of_two(pw) / 2).max(1);
        let base_h = (nearest_power_of_two(ph) / 2).max(1);

        let mut levels = [(1_u32, 1_u32); MIP_LEVELS];
        let (mut lw, mut lh) = (base_w, base_h);
        for level in &mut levels {
            *level = (lw, lh);
            lw = (lw / 2).max(1);
            lh = (lh / 2).max(1);
        }

        Self {
            physical: (pw, ph),
            bloom_base: (base_w, base_h),
            levels,
        }
    }
}

/// One offscreen render target: a texture plus its sampled view.
///
/// `resize` recreates the inner texture only when dimensions actually
/// change, so repeated resizes to the same size are free.
pub struct Surface {
    label: String,
    format: wgpu::TextureFormat,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl Surface {
    /// Allocate a 1x1 placeholder surface; call [`resize`](Self::resize)
    /// before first use.
    pub fn new(
        device: &wgpu::Device,
        label: impl Into<String>,
        format: wgpu::TextureFormat,
    ) -> Self {
        let label = label.into();
        let (texture, view) = Self::create_texture(device, &label, format, 1, 1);
        Self {
            label,
            format,
            texture,
            view,
        }
    }

    fn create_texture(
        device: &wgpu::Device,
        label: &str,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> (wgpu::Texture, wgpu::TextureView) {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        (texture, view)
    }

    /// Resize to the given dimensions; no-op when already that size.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        let width = width.max(1);
        let height = height.max(1);
        if (width, height) == self.size() {
            return;
        }
        let (texture, view) =
            Self::create_texture(device, &self.label, self.format, width, height);
        self.texture = texture;
        self.view = view;
    }

    /// The sampled/attachment view of the current texture. Invalidated by
    /// [`resize`](Self::resize); bind groups holding it must be rebuilt.
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Current dimensions in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.texture.width(), self.texture.height())
    }
}

/// Two parallel mip chains holding the horizontal and vertical halves of
/// each progressive blur level. `horizontal[i]` and `vertical[i]` always
/// share dimensions.
pub struct MipChain {
    /// Horizontal blur result per level; level 0 doubles as the bloom
    /// composite's scratch target once its vertical pass has consumed it.
    pub horizontal: [Surface; MIP_LEVELS],
    /// Vertical blur result per level; the input feeding level `i + 1` and
    /// one of the bloom composite's five inputs.
    pub vertical: [Surface; MIP_LEVELS],
}

impl MipChain {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        Self {
            horizontal: std::array::from_fn(|i| {
                Surface::new(device, format!("Mip Blur H{i}"), format)
            }),
            vertical: std::array::from_fn(|i| {
                Surface::new(device, format!("Mip Blur V{i}"), format)
            }),
        }
    }

    fn resize(&mut self, device: &wgpu::Device, levels: &[(u32, u32); MIP_LEVELS]) {
        for (i, &(w, h)) in levels.iter().enumerate() {
            self.horizontal[i].resize(device, w, h);
            self.vertical[i].resize(device, w, h);
        }
    }
}

/// Owns every surface the pipeline renders into.
///
/// All color surfaces share the display format so any of them can feed any
/// pass or be presented. Several surfaces serve a second role later in the
/// frame once their first consumer has read them: the level-0 horizontal
/// mip takes the bloom composite output, and the mutually exclusive
/// motion/focus blur stages reuse `motion` and `smoothed` as focus scratch.
pub struct TargetPool {
    /// Scene color, full resolution.
    pub scene: Surface,
    /// Scene depth, sampled by motion blur for world-position reconstruction.
    pub scene_depth: Surface,
    /// Depth attachment for direct-to-display bypass rendering, sized to the
    /// swapchain rather than the internal resolution.
    pub display_depth: Surface,
    /// Anti-aliased scene color; focus blur reuses it as its vertical-pass
    /// output.
    pub smoothed: Surface,
    /// Motion blur output; focus blur reuses it as its horizontal-pass
    /// output.
    pub motion: Surface,
    /// Bright-pass extraction at `bloom_base` size.
    pub bright: Surface,
    /// Progressive blur chain.
    pub mips: MipChain,
}

impl TargetPool {
    /// Allocate every surface at 1x1.
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        Self {
            scene: Surface::new(device, "Scene Color", format),
            scene_depth: Surface::new(device, "Scene Depth", DEPTH_FORMAT),
            display_depth: Surface::new(device, "Display Depth", DEPTH_FORMAT),
            smoothed: Surface::new(device, "Smoothed Color", format),
            motion: Surface::new(device, "Motion Blur Color", format),
            bright: Surface::new(device, "Bright Extraction", format),
            mips: MipChain::new(device, format),
        }
    }

    /// Resize every surface per `sizes`; `display_size` is the swapchain
    /// dimension used only by the bypass depth attachment.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        sizes: &PoolSizes,
        display_size: (u32, u32),
    ) {
        let (pw, ph) = sizes.physical;
        self.scene.resize(device, pw, ph);
        self.scene_depth.resize(device, pw, ph);
        self.display_depth
            .resize(device, display_size.0, display_size.1);
        self.smoothed.resize(device, pw, ph);
        self.motion.resize(device, pw, ph);
        let (bw, bh) = sizes.bloom_base;
        self.bright.resize(device, bw, bh);
        self.mips.resize(device, &sizes.levels);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_power_of_two_rounds_in_log_space() {
        assert_eq!(nearest_power_of_two(0), 1);
        assert_eq!(nearest_power_of_two(1), 1);
        assert_eq!(nearest_power_of_two(2), 2);
        // log2(3) = 1.58 rounds up
        assert_eq!(nearest_power_of_two(3), 4);
        // log2(5) = 2.32 rounds down
        assert_eq!(nearest_power_of_two(5), 4);
        assert_eq!(nearest_power_of_two(6), 8);
        assert_eq!(nearest_power_of_two(1024), 1024);
        // 1024 * sqrt(2) = 1448.15: just below stays, just above rounds up
        assert_eq!(nearest_power_of_two(1448), 1024);
        assert_eq!(nearest_power_of_two(1449), 2048);
        assert_eq!(nearest_power_of_two(3840), 4096);
        assert_eq!(nearest_power_of_two(2160), 2048);
    }

    #[test]
    fn full_hd_at_dpr_2_matches_reference_sizes() {
        let sizes = PoolSizes::compute(1920.0, 1080.0, 2.0);
        assert_eq!(sizes.physical, (3840, 2160));
        assert_eq!(sizes.bloom_base, (2048, 1024));
        assert_eq!(
            sizes.levels,
            [
                (2048, 1024),
                (1024, 512),
                (512, 256),
                (256, 128),
                (128, 64),
            ]
        );
    }

    #[test]
    fn levels_halve_with_floor_and_clamp() {
        for &(w, h, dpr) in &[
            (1.0, 1.0, 1.0),
            (3.0, 5.0, 1.0),
            (640.0, 360.0, 1.5),
            (2560.0, 1440.0, 2.0),
            (333.0, 777.0, 1.25),
        ] {
            let sizes = PoolSizes::compute(w, h, dpr);
            assert_eq!(sizes.levels[0], sizes.bloom_base);
            for i in 1..MIP_LEVELS {
                let (pw, ph) = sizes.levels[i - 1];
                assert_eq!(
                    sizes.levels[i],
                    ((pw / 2).max(1), (ph / 2).max(1)),
                    "level {i} of {w}x{h}@{dpr}"
                );
                assert!(sizes.levels[i].0 >= 1 && sizes.levels[i].1 >= 1);
            }
        }
    }

    #[test]
    fn physical_size_rounds_half_up() {
        let sizes = PoolSizes::compute(100.5, 100.4, 1.0);
        assert_eq!(sizes.physical, (101, 100));
    }

    #[test]
    fn compute_is_deterministic() {
        let a = PoolSizes::compute(1280.0, 720.0, 1.0);
        let b = PoolSizes::compute(1280.0, 720.0, 1.0);
        assert_eq!(a, b);
    }

    #[test]
    fn kernel_sizes_increase_with_level() {
        for i in 1..MIP_LEVELS {
            assert!(KERNEL_SIZES[i] > KERNEL_SIZES[i - 1]);
            assert_eq!(KERNEL_SIZES[i] % 2, 1, "kernels are odd-sized");
        }
    }
}
