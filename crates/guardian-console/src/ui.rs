use crate::state::{App, ReportSection, ReportState, View};
use crate::theme::{self, icons};
use guardian_core::{duration, report, tokens, verify_log, ReportView, ScanReport};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    let area = f.size();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, layout[0]);
    match app.view {
        View::Jobs => render_jobs(f, app, layout[1]),
        View::Detail => render_detail(f, app, layout[1]),
        View::Report => render_report(f, app, layout[1]),
    }
    render_footer(f, app, layout[2]);

    if let Some(alert) = &app.alert {
        render_alert(f, alert, area);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let state = if app.loading {
        Span::styled("loading...", Style::default().fg(theme::WARN))
    } else if let Some(error) = &app.list_error {
        Span::styled(
            format!("error: {}", ellipsize(error, 60)),
            Style::default().fg(theme::ERR),
        )
    } else {
        Span::styled(
            format!("{} jobs", app.jobs.len()),
            Style::default().fg(theme::MUTED),
        )
    };
    let mut line = vec![
        Span::styled("Guardian Console", theme::HEADER_STYLE),
        Span::raw("  "),
        state,
    ];
    if let Some(note) = &app.status_note {
        line.push(Span::raw("  "));
        line.push(Span::styled(
            ellipsize(note, 48),
            Style::default().fg(theme::WARN),
        ));
    }
    let paragraph = Paragraph::new(Line::from(line)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::MUTED)),
    );
    f.render_widget(paragraph, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let keys = match app.view {
        View::Jobs => "j/k move  enter inspect  r refresh  c cancel  q quit",
        View::Detail => "enter report  c cancel  esc back  q quit",
        View::Report => "tab section  esc back  q quit",
    };
    f.render_widget(
        Paragraph::new(Span::styled(keys, Style::default().fg(theme::MUTED))),
        area,
    );
}

fn render_jobs(f: &mut Frame, app: &App, area: Rect) {
    if app.jobs.is_empty() {
        let empty = if app.loading {
            "Fetching scans..."
        } else {
            "No scans yet. Submit one with `guardian scan --repo-url <url>`."
        };
        f.render_widget(
            Paragraph::new(empty)
                .style(Style::default().fg(theme::MUTED))
                .block(Block::default().borders(Borders::ALL).title("Scans")),
            area,
        );
        return;
    }

    let header = Row::new(vec!["ID", "Repository", "PR", "Status", "Duration", "Tokens"])
        .style(theme::HEADER_STYLE);
    let rows: Vec<Row> = app
        .jobs
        .iter()
        .enumerate()
        .map(|(index, job)| {
            let style = if index == app.selected {
                theme::SELECTED_STYLE
            } else {
                Style::default().fg(theme::TEXT)
            };
            Row::new(vec![
                Cell::from(job.id.to_string()),
                Cell::from(ellipsize(&job.repo, 40)),
                Cell::from(if job.pr_number > 0 {
                    format!("#{}", job.pr_number)
                } else {
                    "-".to_string()
                }),
                Cell::from(Span::styled(
                    job.status.to_string(),
                    Style::default().fg(theme::status_color(&job.status)),
                )),
                Cell::from(duration::duration_display(job, app.now)),
                Cell::from(tokens::job_summary(job)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Min(24),
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("Scans"));
    f.render_widget(table, area);
}

fn render_detail(f: &mut Frame, app: &App, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let summary = match app.watched_job() {
        Some(job) => vec![
            Line::from(vec![
                Span::styled(format!("Scan #{}", job.id), theme::HEADER_STYLE),
                Span::raw("  "),
                Span::styled(
                    job.status.to_string(),
                    Style::default().fg(theme::status_color(&job.status)),
                ),
                Span::raw("  "),
                Span::styled(
                    duration::duration_display(job, app.now),
                    Style::default().fg(theme::TEXT),
                ),
            ]),
            Line::from(Span::styled(
                ellipsize(&job.repo, 80),
                Style::default().fg(theme::MUTED),
            )),
        ],
        None => vec![Line::from(Span::styled(
            "Job no longer in the table.",
            Style::default().fg(theme::MUTED),
        ))],
    };
    f.render_widget(
        Paragraph::new(summary).block(Block::default().borders(Borders::ALL)),
        layout[0],
    );

    render_phase_ledger(f, app, layout[1]);
}

fn render_phase_ledger(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Phases");
    let Some(watched) = &app.watched else {
        f.render_widget(block, area);
        return;
    };
    if watched.logs.is_empty() {
        f.render_widget(
            Paragraph::new("No telemetry yet.")
                .style(Style::default().fg(theme::MUTED))
                .block(block),
            area,
        );
        return;
    }

    let ledger = tokens::latest_per_step(&watched.logs);
    let total: u64 = tokens::job_total(&watched.logs);
    let header =
        Row::new(vec!["Phase", "Model", "Input", "Output", "Total", "Message"]).style(theme::HEADER_STYLE);
    let mut rows: Vec<Row> = ledger
        .iter()
        .map(|log| {
            Row::new(vec![
                Cell::from(log.step.clone()),
                Cell::from(log.model.clone().unwrap_or_else(|| "-".to_string())),
                Cell::from(tokens::effective_input(log).to_string()),
                Cell::from(tokens::effective_output(log).to_string()),
                Cell::from(tokens::effective_total(log).to_string()),
                Cell::from(ellipsize(&log.message, 48)),
            ])
            .style(Style::default().fg(theme::TEXT))
        })
        .collect();
    rows.push(
        Row::new(vec![
            Cell::from("Total"),
            Cell::from(""),
            Cell::from(""),
            Cell::from(""),
            Cell::from(total.to_string()),
            Cell::from(""),
        ])
        .style(theme::HEADER_STYLE),
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(22),
            Constraint::Length(18),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Length(8),
            Constraint::Min(16),
        ],
    )
    .header(header)
    .block(block);
    f.render_widget(table, area);
}

fn render_report(f: &mut Frame, app: &App, area: Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(area);

    let tabs: Vec<Span> = ReportSection::ALL
        .iter()
        .flat_map(|section| {
            let style = if *section == app.report_section {
                theme::HEADER_STYLE
            } else {
                Style::default().fg(theme::MUTED)
            };
            [Span::styled(section.title(), style), Span::raw("  ")]
        })
        .collect();
    f.render_widget(Paragraph::new(Line::from(tabs)), layout[0]);

    let body = layout[1];
    match &app.report {
        ReportState::Idle | ReportState::Loading { .. } => {
            render_report_note(f, "Loading report...", theme::MUTED, body);
        }
        ReportState::Failed { message, .. } => {
            f.render_widget(
                Paragraph::new(vec![
                    Line::from(Span::styled(
                        "Report not generated yet.",
                        Style::default().fg(theme::MUTED),
                    )),
                    Line::from(Span::styled(
                        format!("fetch failed: {}", ellipsize(message, 90)),
                        Style::default().fg(theme::ERR),
                    )),
                ])
                .block(Block::default().borders(Borders::ALL)),
                body,
            );
        }
        ReportState::Loaded { report, .. } => {
            let view = ReportView::new(report);
            if !view.is_generated() && app.report_section == ReportSection::Overview {
                render_report_note(f, "Report not generated yet.", theme::MUTED, body);
                return;
            }
            match app.report_section {
                ReportSection::Overview => render_overview(f, view, body),
                ReportSection::Findings => render_findings(f, view, body),
                ReportSection::Environment => render_environment(f, view, body),
                ReportSection::Fixes => render_fixes(f, view, body),
                ReportSection::Verification => render_verification(f, report, view, body),
            }
        }
    }
}

fn render_report_note(f: &mut Frame, text: &str, color: Color, area: Rect) {
    f.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(color))
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn render_overview(f: &mut Frame, view: ReportView, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();

    let mut stage_spans: Vec<Span> = Vec::new();
    for (stage, state) in view.stages() {
        let (marker, color) = theme::stage_style(state);
        stage_spans.push(Span::styled(
            format!("{marker} {}", stage.title()),
            Style::default().fg(color),
        ));
        stage_spans.push(Span::raw("   "));
    }
    lines.push(Line::from(stage_spans));
    lines.push(Line::from(""));

    lines.push(Line::from(vec![
        Span::styled("Findings: ", Style::default().fg(theme::MUTED)),
        Span::raw(view.vulnerabilities().len().to_string()),
        Span::styled("   Fixes: ", Style::default().fg(theme::MUTED)),
        Span::raw(view.remediation_count().to_string()),
        Span::styled("   Verified: ", Style::default().fg(theme::MUTED)),
        Span::raw(format!(
            "{}/{}",
            view.verification_passed(),
            view.verification_total()
        )),
    ]));

    let summary = view.summary();
    if !summary.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Summary", theme::HEADER_STYLE)));
        for (key, value) in summary {
            let value = match value {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            lines.push(Line::from(vec![
                Span::styled(format!("  {key}: "), Style::default().fg(theme::MUTED)),
                Span::raw(ellipsize(&value, 64)),
            ]));
        }
    }

    if let Some(error) = view.error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Pipeline error: {}", ellipsize(error, 96)),
            Style::default().fg(theme::ERR),
        )));
    }

    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Pipeline")),
        area,
    );
}

fn render_findings(f: &mut Frame, view: ReportView, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Findings");
    let vulnerabilities = view.vulnerabilities();
    if vulnerabilities.is_empty() {
        f.render_widget(
            Paragraph::new("No vulnerabilities reported.")
                .style(Style::default().fg(theme::MUTED))
                .block(block),
            area,
        );
        return;
    }

    let header = Row::new(vec!["Sev", "Location", "Rule", "Message"]).style(theme::HEADER_STYLE);
    let rows: Vec<Row> = vulnerabilities
        .iter()
        .map(|vuln| {
            let (marker, color) = theme::severity_marker(&vuln.severity);
            let location = if vuln.line > 0 {
                format!("{}:{}", vuln.path, vuln.line)
            } else {
                vuln.path.clone()
            };
            Row::new(vec![
                Cell::from(Span::styled(marker, Style::default().fg(color))),
                Cell::from(ellipsize(&location, 36)),
                Cell::from(ellipsize(&vuln.id, 24)),
                Cell::from(ellipsize(&vuln.msg, 60)),
            ])
            .style(Style::default().fg(theme::TEXT))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(38),
            Constraint::Length(26),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(block);
    f.render_widget(table, area);
}

fn render_environment(f: &mut Frame, view: ReportView, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    match view.ecosystem() {
        Some(eco) => {
            lines.push(Line::from(vec![
                Span::styled("Language: ", Style::default().fg(theme::MUTED)),
                Span::raw(eco.language.clone()),
                Span::styled("   Image: ", Style::default().fg(theme::MUTED)),
                Span::raw(eco.docker_image.clone()),
            ]));
            if !eco.dep_install_cmd.is_empty() {
                lines.push(Line::from(vec![
                    Span::styled("Install: ", Style::default().fg(theme::MUTED)),
                    Span::raw(ellipsize(&eco.dep_install_cmd, 90)),
                ]));
            }
            if !eco.test_cmd.is_empty() {
                lines.push(Line::from(vec![
                    Span::styled("Test: ", Style::default().fg(theme::MUTED)),
                    Span::raw(eco.test_cmd.join(" ")),
                ]));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "Environment not detected yet.",
            Style::default().fg(theme::MUTED),
        ))),
    }

    let libraries = view.detected_libraries();
    if !libraries.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Detected libraries",
            theme::HEADER_STYLE,
        )));
        for (language, package) in libraries {
            lines.push(Line::from(vec![
                Span::styled(format!("  {} ", icons::DOT), Style::default().fg(theme::MUTED)),
                Span::styled(format!("[{language}] "), Style::default().fg(theme::WARN)),
                Span::raw(package.to_string()),
            ]));
        }
    }

    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Environment")),
        area,
    );
}

fn render_fixes(f: &mut Frame, view: ReportView, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Fixes");
    let remediation = view.remediation();
    if remediation.is_empty() {
        f.render_widget(
            Paragraph::new("No fixes proposed.")
                .style(Style::default().fg(theme::MUTED))
                .block(block),
            area,
        );
        return;
    }

    let header = Row::new(vec!["Lang", "Path", "Kind", "Verified", "Fix", "Test"])
        .style(theme::HEADER_STYLE);
    let rows: Vec<Row> = remediation
        .iter()
        .map(|fix| {
            let badge = theme::lang_badge(report::language_for_path(&fix.path));
            let verified = match view.verification_for(&fix.path) {
                Some(entry) if entry.verified => {
                    Span::styled(icons::VERIFIED, Style::default().fg(theme::OK))
                }
                Some(_) => Span::styled(icons::FAILED, Style::default().fg(theme::ERR)),
                None => Span::styled("-", Style::default().fg(theme::MUTED)),
            };
            Row::new(vec![
                Cell::from(badge),
                Cell::from(ellipsize(&fix.path, 40)),
                Cell::from(fix.kind.clone()),
                Cell::from(verified),
                Cell::from(format!("{} lines", fix.fix_code.lines().count())),
                Cell::from(if fix.test_code.is_empty() {
                    "-".to_string()
                } else {
                    format!("{} lines", fix.test_code.lines().count())
                }),
            ])
            .style(Style::default().fg(theme::TEXT))
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(42),
            Constraint::Length(10),
            Constraint::Length(9),
            Constraint::Length(11),
            Constraint::Min(8),
        ],
    )
    .header(header)
    .block(block);
    f.render_widget(table, area);
}

fn render_verification(f: &mut Frame, report: &ScanReport, view: ReportView, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title("Verification");
    if report.verification.is_empty() {
        f.render_widget(
            Paragraph::new("No verification results yet.")
                .style(Style::default().fg(theme::MUTED))
                .block(block),
            area,
        );
        return;
    }

    let mut lines: Vec<Line> = vec![Line::from(Span::styled(
        format!(
            "{}/{} fixes verified",
            view.verification_passed(),
            view.verification_total()
        ),
        theme::HEADER_STYLE,
    ))];

    for entry in &report.verification {
        let (marker, color) = if entry.verified {
            (icons::VERIFIED, theme::OK)
        } else {
            (icons::FAILED, theme::ERR)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker:>4} "), Style::default().fg(color)),
            Span::raw(ellipsize(&entry.path, 60)),
        ]));
        if let Some(error) = &entry.error {
            for outcome in verify_log::parse_verification_log(error) {
                let color = if outcome.passed { theme::OK } else { theme::ERR };
                lines.push(Line::from(Span::styled(
                    format!("       {}", outcome.name),
                    Style::default().fg(color),
                )));
            }
        }
    }

    f.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(block),
        area,
    );
}

fn render_alert(f: &mut Frame, alert: &str, area: Rect) {
    let width = (area.width.saturating_sub(8)).min(70).max(20);
    let height = 5;
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(vec![
            Line::from(Span::styled(
                alert.to_string(),
                Style::default().fg(theme::ERR),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "press esc to dismiss",
                Style::default().fg(theme::MUTED),
            )),
        ])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Error")
                .border_style(Style::default().fg(theme::ERR).add_modifier(Modifier::BOLD)),
        ),
        popup,
    );
}

fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{truncated}...")
}
