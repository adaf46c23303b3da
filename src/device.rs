//! The opaque hardware resource provider. Resources hand decoded bytes over
//! this boundary and get back lightweight handles; everything else about the
//! rendering/audio backend stays on the other side of it.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use crate::errors::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u32);

/// The texel layout of a decoded texture.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    R8,
    Rgb8,
    Rgba8,
}

impl TextureFormat {
    /// The size of a single texel in bytes.
    #[inline]
    pub fn stride(self) -> usize {
        match self {
            TextureFormat::R8 => 1,
            TextureFormat::Rgb8 => 3,
            TextureFormat::Rgba8 => 4,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureParams {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundParams {
    pub channels: u8,
    pub sample_rate: u32,
}

/// A device realizes decoded payloads as backend-resident objects. All the
/// creation entry points may block and are called from the loading thread
/// only; deletions are cheap bookkeeping.
pub trait Device: Send + Sync + 'static {
    fn create_texture(&self, params: TextureParams, texels: &[u8]) -> Result<TextureHandle>;
    fn delete_texture(&self, handle: TextureHandle);

    fn create_shader(&self, vs: &str, fs: &str) -> Result<ShaderHandle>;
    fn delete_shader(&self, handle: ShaderHandle);

    fn create_sound(&self, params: SoundParams, samples: &[u8]) -> Result<SoundHandle>;
    fn delete_sound(&self, handle: SoundHandle);
}

/// A `Device` without an actual backend. It validates payload sizes, hands
/// out monotonically increasing handles and keeps counters of live objects,
/// which makes it the workhorse of the test suite.
pub struct HeadlessDevice {
    next: AtomicU32,
    live_textures: AtomicUsize,
    live_shaders: AtomicUsize,
    live_sounds: AtomicUsize,
    creations: AtomicUsize,
    fail_next: AtomicBool,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        HeadlessDevice {
            next: AtomicU32::new(1),
            live_textures: AtomicUsize::new(0),
            live_shaders: AtomicUsize::new(0),
            live_sounds: AtomicUsize::new(0),
            creations: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
        }
    }

    /// Arms the device to reject the next creation request.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub fn live_textures(&self) -> usize {
        self.live_textures.load(Ordering::SeqCst)
    }

    pub fn live_shaders(&self) -> usize {
        self.live_shaders.load(Ordering::SeqCst)
    }

    pub fn live_sounds(&self) -> usize {
        self.live_sounds.load(Ordering::SeqCst)
    }

    /// The total number of successful creations so far.
    pub fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    fn checkpoint(&self, what: &str) -> Result<u32> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(Error::Other(format!("Device refused to create {}.", what)));
        }

        self.creations.fetch_add(1, Ordering::SeqCst);
        Ok(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

impl Device for HeadlessDevice {
    fn create_texture(&self, params: TextureParams, texels: &[u8]) -> Result<TextureHandle> {
        let expected = params.width as usize * params.height as usize * params.format.stride();
        if texels.len() != expected {
            return Err(Error::BadParam(format!(
                "Texture payload has {} bytes, expected {}.",
                texels.len(),
                expected
            )));
        }

        let id = self.checkpoint("texture")?;
        self.live_textures.fetch_add(1, Ordering::SeqCst);
        Ok(TextureHandle(id))
    }

    fn delete_texture(&self, _: TextureHandle) {
        self.live_textures.fetch_sub(1, Ordering::SeqCst);
    }

    fn create_shader(&self, vs: &str, fs: &str) -> Result<ShaderHandle> {
        if vs.is_empty() || fs.is_empty() {
            return Err(Error::BadParam("Shader sources must not be empty.".into()));
        }

        let id = self.checkpoint("shader")?;
        self.live_shaders.fetch_add(1, Ordering::SeqCst);
        Ok(ShaderHandle(id))
    }

    fn delete_shader(&self, _: ShaderHandle) {
        self.live_shaders.fetch_sub(1, Ordering::SeqCst);
    }

    fn create_sound(&self, params: SoundParams, samples: &[u8]) -> Result<SoundHandle> {
        if params.channels == 0 || params.sample_rate == 0 {
            return Err(Error::BadParam("Sound parameters are malformed.".into()));
        }

        if samples.is_empty() {
            return Err(Error::BadParam("Sound payload must not be empty.".into()));
        }

        let id = self.checkpoint("sound")?;
        self.live_sounds.fetch_add(1, Ordering::SeqCst);
        Ok(SoundHandle(id))
    }

    fn delete_sound(&self, _: SoundHandle) {
        self.live_sounds.fetch_sub(1, Ordering::SeqCst);
    }
}
