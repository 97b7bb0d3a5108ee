use crate::device::{Device, DeviceLimits};
use crate::error::{Error, Result};

/// Proof that the rasterization API was initialized.
///
/// Returned by [`init`] and consumed by [`Context::new`](crate::Context::new),
/// so at most one context drives a given device at a time.
#[derive(Debug)]
pub struct Instance<D: Device> {
    pub(crate) device: D,
    pub(crate) limits: DeviceLimits,
}

impl<D: Device> Instance<D> {
    #[inline]
    pub fn limits(&self) -> DeviceLimits {
        self.limits
    }

    #[inline]
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Gives the device back, ending the session.
    pub fn into_device(self) -> D {
        self.device
    }
}

/// Validates `device` and queries its limits.
pub fn init<D: Device>(device: D) -> Result<Instance<D>> {
    let limits = device.limits();
    if limits.max_texture_size == 0 {
        return Err(Error::Unsupported(
            "device reports a zero maximum texture size".to_owned(),
        ));
    }

    log::info!(
        "lazuli initialized (max texture {}px, max {} MSAA samples)",
        limits.max_texture_size,
        limits.max_samples
    );

    Ok(Instance { device, limits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;

    #[test]
    fn init_reports_limits() {
        let instance = init(HeadlessDevice::new()).unwrap();
        assert_eq!(instance.limits().max_samples, 8);
        assert_eq!(instance.limits().max_texture_size, 4096);
    }

    #[test]
    fn init_rejects_device_without_textures() {
        let dev = HeadlessDevice::with_limits(DeviceLimits {
            max_texture_size: 0,
            max_samples: 0,
        });
        assert!(matches!(init(dev), Err(Error::Unsupported(_))));
    }
}
