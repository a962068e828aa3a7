// Built-in page templates
// Each logical view name maps to a function rendering the request and session scopes

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::Local;

use super::{display_value, escape_html, View, ViewResolver};
use crate::error::WebError;
use crate::model::{Department, Employee, Model};

type RenderFn = fn(&Model, &Model) -> Result<String, WebError>;

struct Template {
    render: RenderFn,
}

impl View for Template {
    fn render(&self, model: &Model, session: &Model) -> Result<String, WebError> {
        (self.render)(model, session)
    }
}

/// Resolves logical names to the built-in templates
pub struct TemplateViewResolver {
    templates: HashMap<&'static str, Arc<dyn View>>,
}

impl TemplateViewResolver {
    pub fn standard() -> Self {
        let entries: [(&'static str, RenderFn); 4] = [
            ("index", render_index),
            ("success", render_success),
            ("list", render_list),
            ("input", render_input),
        ];
        let templates = entries
            .into_iter()
            .map(|(name, render)| (name, Arc::new(Template { render }) as Arc<dyn View>))
            .collect();
        Self { templates }
    }
}

impl ViewResolver for TemplateViewResolver {
    fn resolve_view_name(&self, name: &str) -> Option<Arc<dyn View>> {
        self.templates.get(name).cloned()
    }
}

/// Custom view registered by bean name
pub struct HelloView;

impl View for HelloView {
    fn render(&self, _model: &Model, _session: &Model) -> Result<String, WebError> {
        Ok(page(
            "Hello View",
            &format!(
                "<h4>Hello View</h4>\n<p>time: {}</p>",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            ),
        ))
    }
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        escape_html(title)
    )
}

fn render_scope(out: &mut String, heading: &str, scope: &Model) {
    let _ = writeln!(out, "<h5>{heading}</h5>");
    if scope.is_empty() {
        out.push_str("<p>(empty)</p>\n");
        return;
    }
    out.push_str("<dl>\n");
    for (key, value) in scope.iter() {
        let _ = writeln!(
            out,
            "<dt>{}</dt><dd>{}</dd>",
            escape_html(key),
            escape_html(&display_value(value))
        );
    }
    out.push_str("</dl>\n");
}

fn render_success(model: &Model, session: &Model) -> Result<String, WebError> {
    let mut body = String::from("<h4>Success Page</h4>\n");
    render_scope(&mut body, "Request attributes", model);
    render_scope(&mut body, "Session attributes", session);
    Ok(page("Success", &body))
}

fn render_list(model: &Model, _session: &Model) -> Result<String, WebError> {
    let employees: Vec<Employee> = model.get_as("employees")?.unwrap_or_default();
    let departments: HashMap<u32, String> = model
        .get_as::<Vec<Department>>("departments")?
        .unwrap_or_default()
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();

    let mut body = String::from("<h4>Employees</h4>\n");
    if employees.is_empty() {
        body.push_str("<p>No employee records.</p>\n");
    } else {
        body.push_str(
            "<table border=\"1\" cellpadding=\"10\" cellspacing=\"0\">\n<tr><th>ID</th><th>Name</th><th>Email</th><th>Gender</th><th>Department</th><th>Edit</th><th>Delete</th></tr>\n",
        );
        for employee in &employees {
            let id = employee.id.map(|id| id.to_string()).unwrap_or_default();
            let _ = writeln!(
                body,
                "<tr><td>{id}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td><a href=\"/emp/{id}\">Edit</a></td><td><form action=\"/emp/{id}\" method=\"post\"><input type=\"hidden\" name=\"_method\" value=\"DELETE\"><input type=\"submit\" value=\"Delete\"></form></td></tr>",
                escape_html(&employee.name),
                escape_html(&employee.email),
                employee.gender.map(|g| g.to_string()).unwrap_or_default(),
                employee
                    .department_id
                    .map(|d| department_label(&departments, d))
                    .unwrap_or_default(),
            );
        }
        body.push_str("</table>\n");
    }
    body.push_str("<p><a href=\"/emp\">Add New Employee</a></p>\n");
    Ok(page("Employees", &body))
}

/// Department name for the list, or the bare id when it is not in the model
fn department_label(departments: &HashMap<u32, String>, id: u32) -> String {
    departments
        .get(&id)
        .map_or_else(|| id.to_string(), |name| escape_html(name))
}

fn render_input(model: &Model, _session: &Model) -> Result<String, WebError> {
    let employee: Employee = model.get_as("employee")?.unwrap_or_default();
    let departments: Vec<Department> = model.get_as("departments")?.unwrap_or_default();

    let mut body = String::from("<form action=\"/emp\" method=\"post\">\n");
    if let Some(id) = employee.id {
        let _ = writeln!(
            body,
            "<input type=\"hidden\" name=\"id\" value=\"{id}\">\n<input type=\"hidden\" name=\"_method\" value=\"PUT\">"
        );
    }
    let _ = writeln!(
        body,
        "Name: <input type=\"text\" name=\"name\" value=\"{}\"><br>",
        escape_html(&employee.name)
    );
    let _ = writeln!(
        body,
        "Email: <input type=\"text\" name=\"email\" value=\"{}\"><br>",
        escape_html(&employee.email)
    );

    body.push_str("Gender:");
    for (code, label) in [(1, "Male"), (0, "Female")] {
        let checked = if employee.gender.map(|g| g.code()) == Some(code) {
            " checked"
        } else {
            ""
        };
        let _ = write!(
            body,
            " <label><input type=\"radio\" name=\"gender\" value=\"{code}\"{checked}>{label}</label>"
        );
    }
    body.push_str("<br>\n");

    body.push_str("Department: <select name=\"departmentId\">\n");
    for department in &departments {
        let selected = if employee.department_id == Some(department.id) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            body,
            "<option value=\"{}\"{selected}>{}</option>",
            department.id,
            escape_html(&department.name)
        );
    }
    body.push_str("</select><br>\n<input type=\"submit\" value=\"Submit\">\n</form>\n");

    Ok(page("Employee", &body))
}

fn render_index(_model: &Model, _session: &Model) -> Result<String, WebError> {
    const LINKS: [&str; 14] = [
        "testRequestMapping",
        "testParamsAndHeaders?username=tom&age=11",
        "testAntPath/any/abc",
        "testPathVariable/101",
        "testRestGet/1",
        "testRequestParam?username=tom&age=11",
        "testRequestHeader",
        "testCookieValue",
        "testPojo?id=1&email=tom%40x.io",
        "testServletApi",
        "testModelAndView",
        "testMap",
        "testSessionAttributes",
        "testModelAttribute?id=1&age=13",
    ];
    const FORMS: [(&str, &str); 4] = [
        ("testMethod", "POST"),
        ("testRestPost", "POST"),
        ("testRestPut/1", "PUT"),
        ("testRestDelete/1", "DELETE"),
    ];
    const TAIL: [&str; 3] = ["testViewAndViewResolver", "testView", "testRedirect"];

    let mut body = String::from("<h4>Demos</h4>\n<ul>\n");
    for link in LINKS.iter().chain(TAIL.iter()) {
        let label = link.split(['?', '/']).next().unwrap_or(link);
        let _ = writeln!(
            body,
            "<li><a href=\"/springmvc/{}\">{label}</a></li>",
            escape_html(link)
        );
    }
    body.push_str("</ul>\n");
    for (target, method) in FORMS {
        let _ = writeln!(
            body,
            "<form action=\"/springmvc/{target}\" method=\"post\"><input type=\"hidden\" name=\"_method\" value=\"{method}\"><input type=\"submit\" value=\"{method} {target}\"></form>"
        );
    }
    body.push_str("<h4>CRUD</h4>\n<p><a href=\"/emps\">List All Employees</a></p>\n");
    Ok(page("Index", &body))
}
