//! Memory and storage units used by the inventory records.
//!
//! Both supported exports report memory and disk sizes in megabytes while the
//! sizer expects gigabytes. The two newtypes make the conversion explicit in
//! the type of a record, so a record can only be converted once.

use serde::{Deserialize, Serialize};

use crate::model::VmRecord;

/// Number of megabytes in one gigabyte.
pub const MB_PER_GB: f64 = 1024.0;

/// Size expressed in megabytes, as found in the source exports.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Megabytes(pub f64);

/// Size expressed in gigabytes.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gigabytes(pub f64);

impl Megabytes {
    /// Converts to gigabytes without rounding.
    pub fn to_gigabytes(self) -> Gigabytes {
        Gigabytes(self.0 / MB_PER_GB)
    }
}

impl Gigabytes {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl VmRecord<Megabytes> {
    /// Normalises `vRam`, `vmdkTotal` and `vmdkUsed` from megabytes to
    /// gigabytes. Every other field is carried over unchanged.
    pub fn into_gigabytes(self) -> VmRecord<Gigabytes> {
        VmRecord {
            vm_id: self.vm_id,
            vm_name: self.vm_name,
            os: self.os,
            os_name: self.os_name,
            vm_state: self.vm_state,
            v_cpu: self.v_cpu,
            v_ram: self.v_ram.to_gigabytes(),
            vmdk_total: self.vmdk_total.to_gigabytes(),
            vmdk_used: self.vmdk_used.to_gigabytes(),
            ip_addresses: self.ip_addresses,
            cluster: self.cluster,
            virtual_datacenter: self.virtual_datacenter,
            vm_folder: self.vm_folder,
            resource_pool: self.resource_pool,
        }
    }
}

/// Converts a batch of freshly mapped records.
pub fn normalize_records(records: Vec<VmRecord<Megabytes>>) -> Vec<VmRecord<Gigabytes>> {
    records.into_iter().map(VmRecord::into_gigabytes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_divides_by_1024() {
        assert_eq!(Megabytes(2048.0).to_gigabytes(), Gigabytes(2.0));
        assert_eq!(Megabytes(102400.0).to_gigabytes(), Gigabytes(100.0));
        assert_eq!(Megabytes(512.0).to_gigabytes(), Gigabytes(0.5));
    }

    #[test]
    fn conversion_keeps_fractional_precision() {
        let gb = Megabytes(1000.0).to_gigabytes();
        assert!((gb.value() - 0.9765625).abs() < f64::EPSILON);
    }

    #[test]
    fn inverse_conversion_restores_value() {
        for value in [0.0, 1.0, 3.75, 12345.678, 1e9] {
            let restored = Megabytes(value * MB_PER_GB).to_gigabytes();
            assert!((restored.value() - value).abs() <= value.abs() * 1e-12);
        }
    }

    #[test]
    fn record_conversion_touches_only_sizes() {
        let record = VmRecord {
            vm_id: "vm-1".into(),
            vm_name: "web01".into(),
            os: Some("Linux".into()),
            os_name: None,
            vm_state: "true".into(),
            v_cpu: 4,
            v_ram: Megabytes(4096.0),
            vmdk_total: Megabytes(20480.0),
            vmdk_used: Megabytes(10240.0),
            ip_addresses: "10.0.0.1".into(),
            cluster: "C1".into(),
            virtual_datacenter: "DC".into(),
            vm_folder: None,
            resource_pool: None,
        };

        let converted = record.clone().into_gigabytes();
        assert_eq!(converted.v_ram, Gigabytes(4.0));
        assert_eq!(converted.vmdk_total, Gigabytes(20.0));
        assert_eq!(converted.vmdk_used, Gigabytes(10.0));
        assert_eq!(converted.v_cpu, record.v_cpu);
        assert_eq!(converted.vm_name, record.vm_name);
        assert_eq!(converted.os, record.os);
    }
}
