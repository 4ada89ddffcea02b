//! Text rendering of hunt results

use crate::models::ServiceInstance;

/// Display verbosity. Controls which instances appear in hunt output; it
/// never affects deregistration decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    V0,
    V1,
    V2,
    V3,
}

impl Verbosity {
    pub fn from_count(count: u8) -> Self {
        match count {
            0 => Verbosity::V0,
            1 => Verbosity::V1,
            2 => Verbosity::V2,
            _ => Verbosity::V3,
        }
    }

    pub fn allows(self, other: Verbosity) -> bool {
        self >= other
    }
}

const HEADER: [&str; 5] = ["node", "id", "name", "address", "state"];

/// Render the service list as an aligned table with a summary footer.
/// At V0 only unhealthy instances are listed; V1 and above list everything.
pub fn render_list(instances: &[ServiceInstance], verbosity: Verbosity) -> String {
    let mut rows: Vec<[String; 5]> = Vec::new();
    let mut healthy = 0;
    let mut unhealthy = 0;

    for se in instances {
        let is_healthy = se.is_healthy();
        if is_healthy {
            healthy += 1;
        } else {
            unhealthy += 1;
        }

        if verbosity.allows(Verbosity::V1) || !is_healthy {
            rows.push([
                se.node.name.clone(),
                se.service.id.clone(),
                se.service.service.clone(),
                se.endpoint(),
                format!("healthy={}", is_healthy),
            ]);
        }
    }

    let footer = [
        "summary".to_string(),
        String::new(),
        format!("unhealthy: {}", unhealthy),
        format!("healthy: {}", healthy),
        format!("total: {}", healthy + unhealthy),
    ];

    let mut widths: [usize; 5] = [0; 5];
    for (i, h) in HEADER.iter().enumerate() {
        widths[i] = h.len();
    }
    for row in rows.iter().chain(std::iter::once(&footer)) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut out = String::new();
    render_row(&mut out, &HEADER.map(String::from), &widths);
    for row in &rows {
        render_row(&mut out, row, &widths);
    }
    render_row(&mut out, &footer, &widths);
    out
}

fn render_row(out: &mut String, row: &[String; 5], widths: &[usize; 5]) {
    let mut line = String::new();
    for (cell, width) in row.iter().zip(widths) {
        if !line.is_empty() {
            line.push_str("  ");
        }
        line.push_str(&format!("{:<width$}", cell, width = width));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}
