use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};
use voxstream_core::AudioError;

pub struct DeviceManager {
    host: Host,
}

impl DeviceManager {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    pub fn list_input_devices(&self) -> Result<Vec<(String, Device)>, AudioError> {
        let devices = self
            .host
            .input_devices()
            .map_err(|e| AudioError::DeviceNotFound(e.to_string()))?;

        Ok(devices
            .map(|device| {
                let name = device.name().unwrap_or_else(|_| "unknown".to_string());
                (name, device)
            })
            .collect())
    }

    pub fn get_input_device(&self, name: &str) -> Result<Device, AudioError> {
        if name == "default" {
            return self
                .host
                .default_input_device()
                .ok_or_else(|| AudioError::DeviceNotFound("no default input device".to_string()));
        }

        self.list_input_devices()?
            .into_iter()
            .find(|(dev_name, _)| dev_name == name)
            .map(|(_, device)| device)
            .ok_or_else(|| AudioError::DeviceNotFound(format!("input device not found: {name}")))
    }

    /// Native rate and channel count of a device's default input config.
    pub fn default_input_format(device: &Device) -> Result<(u32, u16), AudioError> {
        let config = device
            .default_input_config()
            .map_err(|e| AudioError::StreamBuild(e.to_string()))?;
        Ok((config.sample_rate().0, config.channels()))
    }
}

impl Default for DeviceManager {
    fn default() -> Self {
        Self::new()
    }
}
