//! netdata external plugin feed
//!
//! At start-up the plugin declares its charts; afterwards, on every poll
//! tick, it sends the last known raw value of each dimension. Temperatures
//! are sent as 1/64 °C counts and scaled by the chart's divisor, so no
//! precision is lost. A chart is skipped until all of its dimensions have
//! been received at least once.

use super::write_err;
use crate::error::PpsError;
use crate::pps::decode::MetricId;
use crate::store::ValueSnapshot;
use std::io::Write;
use std::time::Duration;

/// Default poll interval in seconds
pub const DEFAULT_UPDATE_EVERY: u64 = 20;

/// Environment variable set by netdata when it starts a plugin
pub const NETDATA_ENV: &str = "NETDATA_UPDATE_EVERY";

struct Chart {
    id: &'static str,
    dimensions: &'static [(&'static str, MetricId)],
}

const CHARTS: &[Chart] = &[
    Chart {
        id: "Heating.ambient",
        dimensions: &[
            ("t_room_set", MetricId::SetRoomTemp),
            ("t_room_actual", MetricId::ActualRoomTemp),
            ("t_outside", MetricId::OutsideTemp),
        ],
    },
    Chart {
        id: "Heating.dhw",
        dimensions: &[
            ("t_dhw_set", MetricId::SetDhwTemp),
            ("t_dhw_actual", MetricId::ActualDhwTemp),
        ],
    },
    Chart {
        id: "Heating.flow",
        dimensions: &[("t_heating", MetricId::ActualFlowTemp)],
    },
    Chart {
        id: "Heating.boiler",
        dimensions: &[("t_boiler", MetricId::ActualBoilerTemp)],
    },
    Chart {
        id: "Heating.set_point",
        dimensions: &[
            ("t_present", MetricId::SetDefaultRoomTemp),
            ("t_absent", MetricId::SetAbsentRoomTemp),
        ],
    },
    Chart {
        id: "Heating.present",
        dimensions: &[("present", MetricId::Present)],
    },
    Chart {
        id: "Heating.mode",
        dimensions: &[("mode", MetricId::Mode)],
    },
    Chart {
        id: "Heating.authority",
        dimensions: &[("authority", MetricId::Authority)],
    },
];

const BANNER: &str = "
CHART Heating.ambient 'Ambient T' 'Ambient temperature' 'Celsius' Temperatures Heating line 110
DIMENSION t_room_set 'Set room temperature' absolute 1 64
DIMENSION t_room_actual 'Actual room temperature' absolute 1 64
DIMENSION t_outside 'Outside temperature' absolute 1 64

CHART Heating.dhw 'Domestic hot water T' 'DHW temperature' 'Celsius' Temperatures Heating line 120
DIMENSION t_dhw_set 'Set DHW temperature' absolute 1 64
DIMENSION t_dhw_actual 'Actual DHW temperature' absolute 1 64

CHART Heating.flow 'Heating water T' 'Heating temperature' 'Celsius' Temperatures Heating line 130
DIMENSION t_heating 'Heating temperature' absolute 1 64

CHART Heating.boiler 'Boiler T' 'Boiler temperature' 'Celsius' Temperatures Heating line 135
DIMENSION t_boiler 'Boiler temperature' absolute 1 64

CHART Heating.set_point 'Set temperatures' 'Set temperatures' 'Celsius' Temperatures Heating line 140
DIMENSION t_present 'Present room temperature' absolute 1 64
DIMENSION t_absent 'Absent room temperature' absolute 1 64

CHART Heating.present 'Present' 'Present' 'False/True' Control Heating line 150
DIMENSION present 'Present' absolute

CHART Heating.authority 'Authority' 'Authority' 'Remote/Controller' Control Heating line 160
DIMENSION authority 'Authority' absolute

CHART Heating.mode 'Mode' 'Mode' 'Timed/Manual/Off' Control Heating line 170
DIMENSION mode 'Mode' absolute
";

pub struct NetdataEmitter<W> {
    out: W,
}

impl<W: Write> NetdataEmitter<W> {
    pub fn new(out: W) -> Self {
        NetdataEmitter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Declare the charts; sent once before the first update
    pub fn write_banner(&mut self) -> Result<(), PpsError> {
        self.out.write_all(BANNER.as_bytes()).map_err(write_err)?;
        self.out.flush().map_err(write_err)
    }

    /// Send the values of `snapshot`; `since_last` is the time elapsed since
    /// the previous update (zero for the first one). Returns the number of
    /// charts updated.
    pub fn write_update(&mut self, snapshot: &ValueSnapshot, since_last: Duration) -> Result<usize, PpsError> {
        let dt = since_last.as_micros();
        let mut charts = 0;
        for chart in CHARTS {
            let values: Option<Vec<i32>> = chart
                .dimensions
                .iter()
                .map(|(_, metric)| snapshot.raw(*metric))
                .collect();
            let Some(values) = values else {
                continue;
            };
            writeln!(self.out, "BEGIN {} {}", chart.id, dt).map_err(write_err)?;
            for ((dimension, _), value) in chart.dimensions.iter().zip(values) {
                writeln!(self.out, "SET {dimension} = {value}").map_err(write_err)?;
            }
            writeln!(self.out, "END").map_err(write_err)?;
            charts += 1;
        }
        self.out.flush().map_err(write_err)?;
        Ok(charts)
    }
}
