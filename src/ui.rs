use crate::models::{DayResponse, RoutineView};

pub fn render_day(day: &DayResponse) -> String {
    let routines = if day.routines.is_empty() {
        r#"<p class="empty">No workout for this day yet. Add a routine to start.</p>"#.to_string()
    } else {
        day.routines.iter().map(|routine| render_routine(day, routine)).collect()
    };
    let badge = if day.fully_completed {
        r#"<span class="badge">Completed</span>"#
    } else {
        ""
    };
    let delete = if day.can_delete && !day.routines.is_empty() {
        r#"<button class="btn-danger" onclick="deleteDay()">Delete records</button>"#
    } else {
        ""
    };

    DAY_HTML
        .replace("{{STYLE}}", STYLE)
        .replace("{{DATE}}", &day.date.to_string())
        .replace("{{TITLE}}", &day.date.format("%B %-d").to_string())
        .replace("{{BADGE}}", badge)
        .replace("{{DELETE}}", delete)
        .replace("{{ROUTINES}}", &routines)
        .replace("{{MEMO}}", &escape(&day.memo))
        .replace("{{RESTORE}}", &escape(day.restore.as_deref().unwrap_or_default()))
}

fn render_routine(day: &DayResponse, routine: &RoutineView) -> String {
    let exercises: String = routine
        .exercises
        .iter()
        .map(|exercise| {
            format!(
                r#"<label class="exercise"><input type="checkbox" {checked} onchange="toggle({rid}, {eid})" /> {name}</label>"#,
                checked = if exercise.is_completed { "checked" } else { "" },
                rid = routine.routine_id,
                eid = exercise.exercise_id,
                name = escape(&exercise.exercise_name),
            )
        })
        .collect();

    format!(
        r#"<section class="routine" data-date="{date}">
  <h3>{name} <button class="btn-ghost" onclick="removeRoutine({rid})">Remove</button></h3>
  <div class="progress"><div style="width: {pct}%"></div></div>
  <span class="pct">{pct}%</span>
  <div class="exercises">{exercises}</div>
</section>"#,
        date = day.date,
        name = escape(&routine.routine_name),
        rid = routine.routine_id,
        pct = routine.completion_percent,
    )
}

pub fn render_login() -> String {
    LOGIN_HTML.replace("{{STYLE}}", STYLE)
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            // Placeholders are substituted in sequence; encoded braces keep
            // user text from forming one that a later replace would expand.
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(ch),
        }
    }
    out
}

const STYLE: &str = r#"
    :root {
      --bg-1: #eef4fb;
      --ink: #1f2933;
      --accent: #2563eb;
      --danger: #dc2626;
      --done: #059669;
      --card: rgba(255, 255, 255, 0.92);
      --shadow: 0 24px 60px rgba(37, 99, 235, 0.14);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #f8fafc 70%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(760px, 100%);
      background: var(--card);
      border-radius: 24px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 20px;
    }

    header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 12px;
    }

    .badge {
      background: #d1fae5;
      color: var(--done);
      border-radius: 999px;
      padding: 4px 12px;
      font-size: 0.85rem;
    }

    .routine {
      border: 1px solid #dbeafe;
      border-radius: 16px;
      padding: 16px;
    }

    .progress {
      height: 10px;
      background: #dbeafe;
      border-radius: 999px;
      overflow: hidden;
    }

    .progress div {
      height: 100%;
      background: var(--accent);
    }

    .exercise {
      display: block;
      padding: 6px 0;
    }

    button {
      border: none;
      border-radius: 999px;
      padding: 10px 16px;
      cursor: pointer;
      font-weight: 600;
    }

    .btn-primary {
      background: var(--accent);
      color: white;
    }

    .btn-danger {
      background: white;
      color: var(--danger);
      border: 1px solid var(--danger);
    }

    .btn-ghost {
      background: transparent;
      color: var(--danger);
      padding: 2px 8px;
    }

    textarea, input {
      width: 100%;
      font: inherit;
      padding: 10px;
      border-radius: 12px;
      border: 1px solid #cbd5e1;
    }

    #status[data-type="error"] {
      color: var(--danger);
    }
"#;

const DAY_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Workout Log</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <header>
      <h1>{{TITLE}} workout {{BADGE}}</h1>
      {{DELETE}}
    </header>
    <p class="subtitle">{{RESTORE}}</p>
    {{ROUTINES}}
    <div>
      <input id="routine-ids" placeholder="Routine ids, comma separated" />
      <button class="btn-primary" onclick="addRoutines()">Add routines</button>
    </div>
    <div>
      <textarea id="memo" rows="4" oninput="editMemo()">{{MEMO}}</textarea>
      <button class="btn-primary" id="save-memo" onclick="saveMemo()">Save memo</button>
    </div>
    <p id="status"></p>
  </main>
  <script>
    const date = '{{DATE}}';
    const statusEl = document.getElementById('status');
    let busy = false;

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const call = async (method, path, body) => {
      if (busy) {
        return null;
      }
      busy = true;
      try {
        const response = await fetch(path, {
          method,
          headers: { 'Content-Type': 'application/json' },
          body: body === undefined ? undefined : JSON.stringify(body),
        });
        if (response.status === 401) {
          window.location.href = '/login';
          return null;
        }
        const payload = response.status === 204 ? null : await response.json();
        if (!response.ok) {
          setStatus(payload && payload.error ? payload.error : 'Request failed', 'error');
          return null;
        }
        return payload;
      } catch (err) {
        setStatus('Network error. Please try again.', 'error');
        return null;
      } finally {
        busy = false;
      }
    };

    const reload = (payload) => {
      if (payload) {
        window.location.reload();
      }
    };

    const toggle = async (routineId, exerciseId) => {
      reload(await call('POST', `/api/log/${date}/toggle`, { routineId, exerciseId }));
    };

    const addRoutines = async () => {
      const routineIds = document.getElementById('routine-ids').value
        .split(',')
        .map((value) => Number(value.trim()))
        .filter((value) => Number.isInteger(value) && value > 0);
      reload(await call('POST', `/api/log/${date}/routines`, { routineIds }));
    };

    const removeRoutine = async (routineId) => {
      const path = `/api/log/${date}/routines/${routineId}`;
      const response = await fetch(path, { method: 'DELETE' });
      if (response.status === 409) {
        const payload = await response.json();
        if (!window.confirm(payload.error)) {
          return;
        }
      }
      reload(await call('DELETE', `${path}?confirm=true`));
    };

    const deleteDay = async () => {
      if (!window.confirm('Delete every workout record for this day?')) {
        return;
      }
      reload(await call('DELETE', `/api/log/${date}?confirm=true`));
    };

    const editMemo = async () => {
      const memo = document.getElementById('memo').value;
      await call('PUT', `/api/log/${date}/memo`, { memo });
    };

    const saveMemo = async () => {
      await editMemo();
      const payload = await call('POST', `/api/log/${date}/memo`);
      if (payload) {
        setStatus('Memo saved.', 'ok');
      }
    };
  </script>
</body>
</html>
"#;

const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Log in</title>
  <style>{{STYLE}}</style>
</head>
<body>
  <main class="app">
    <h1>Log in</h1>
    <form id="login">
      <input id="email" type="email" placeholder="Email" required />
      <input id="password" type="password" placeholder="Password" required />
      <button class="btn-primary" type="submit">Log in</button>
    </form>
    <p id="status"></p>
  </main>
  <script>
    document.getElementById('login').addEventListener('submit', async (event) => {
      event.preventDefault();
      const response = await fetch('/api/login', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({
          email: document.getElementById('email').value,
          password: document.getElementById('password').value,
        }),
      });
      if (response.ok) {
        window.location.href = '/';
      } else {
        document.getElementById('status').textContent = 'Login failed.';
      }
    });
  </script>
</body>
</html>
"#;
