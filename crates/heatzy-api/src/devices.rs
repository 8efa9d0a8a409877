// Device endpoints
//
// Bindings listing, single-device lookup, latest telemetry and control.
// Every read returns devices already merged with their latest telemetry.

use futures_util::future::try_join_all;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;

use crate::client::{HeatzyClient, decode};
use crate::error::Error;
use crate::models::{Bindings, Device, Telemetry};

impl HeatzyClient {
    /// List every device bound to the account, merged with its telemetry.
    ///
    /// Telemetry is fetched for all devices concurrently. The result keeps
    /// the order of the bindings list, and any single failure fails the
    /// whole call.
    ///
    /// `GET /bindings`, then `GET /devdata/{did}/latest` per device
    pub async fn list_devices(&self) -> Result<Vec<Device>, Error> {
        let url = self.endpoint(&["bindings"]);
        let (status, body) = self.get(url).await?;

        if status != StatusCode::OK {
            return Err(Error::DeviceList {
                status: status.as_u16(),
            });
        }

        let devices = decode::<Bindings>(&body)?.devices.unwrap_or_default();
        debug!(count = devices.len(), "fetching telemetry for bound devices");

        try_join_all(
            devices
                .into_iter()
                .map(|device| self.merge_with_device_data(device)),
        )
        .await
    }

    /// Fetch one device by id, merged with its telemetry.
    ///
    /// `GET /devices/{id}`, then `GET /devdata/{id}/latest`
    pub async fn get_device(&self, device_id: &str) -> Result<Device, Error> {
        let url = self.endpoint(&["devices", device_id]);
        let (status, body) = self.get(url).await?;

        if status != StatusCode::OK {
            return Err(Error::DeviceFetch {
                status: status.as_u16(),
                device_id: device_id.to_owned(),
            });
        }

        let device: Device = decode(&body)?;
        let telemetry = self.get_device_data(device_id).await?;
        Ok(device.merge(telemetry))
    }

    /// Fetch the latest telemetry for one device.
    ///
    /// `GET /devdata/{id}/latest`
    pub async fn get_device_data(&self, device_id: &str) -> Result<Telemetry, Error> {
        let url = self.endpoint(&["devdata", device_id, "latest"]);
        let (status, body) = self.get(url).await?;

        if status != StatusCode::OK {
            return Err(Error::DeviceData {
                status: status.as_u16(),
                device_id: device_id.to_owned(),
            });
        }

        decode(&body)
    }

    /// Send a control command to a device.
    ///
    /// The payload is forwarded as-is, e.g. `{"attrs": {"mode": 0}}`.
    ///
    /// `POST /control/{id}`
    pub async fn control_device(
        &self,
        device_id: &str,
        payload: &impl Serialize,
    ) -> Result<(), Error> {
        let url = self.endpoint(&["control", device_id]);
        debug!(device_id, "sending control command");
        let (status, _) = self.post(url, payload).await?;

        if status != StatusCode::OK {
            return Err(Error::Control {
                status: status.as_u16(),
                device_id: device_id.to_owned(),
            });
        }
        Ok(())
    }

    async fn merge_with_device_data(&self, device: Device) -> Result<Device, Error> {
        let device_id = device.did().ok_or(Error::MissingDeviceId)?.to_owned();
        let telemetry = self.get_device_data(&device_id).await?;
        Ok(device.merge(telemetry))
    }
}
