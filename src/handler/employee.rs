//! Employee CRUD handler
//!
//! List, create, edit, update and delete employees. Every mutation ends in a
//! redirect back to the list.

use hyper::Method;

use super::{Endpoint, HandlerContext};
use crate::binding::resolve_model_attribute;
use crate::error::WebError;
use crate::logger;
use crate::model::{Employee, Outcome};
use crate::routing::RequestMapping;
use crate::session::SessionAttributes;

const LIST_REDIRECT: &str = "/emps";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmployeeAction {
    List,
    Input,
    Save,
    Edit,
    Update,
    Delete,
}

pub fn mappings() -> Vec<RequestMapping<Endpoint>> {
    use EmployeeAction::{Delete, Edit, Input, List, Save, Update};

    [
        ("/emps", Method::GET, List),
        ("/emp", Method::GET, Input),
        ("/emp", Method::POST, Save),
        ("/emp", Method::PUT, Update),
        ("/emp/{id}", Method::GET, Edit),
        ("/emp/{id}", Method::DELETE, Delete),
    ]
    .into_iter()
    .map(|(path, method, action)| {
        RequestMapping::new(path, Endpoint::Employee(action)).method(method)
    })
    .collect()
}

pub async fn invoke(
    action: EmployeeAction,
    ctx: &mut HandlerContext<'_>,
) -> Result<Outcome, WebError> {
    match action {
        EmployeeAction::List => list(ctx).await,
        EmployeeAction::Input => input(ctx),
        EmployeeAction::Save => save(ctx).await,
        EmployeeAction::Edit => edit(ctx).await,
        EmployeeAction::Update => update(ctx).await,
        EmployeeAction::Delete => delete(ctx).await,
    }
}

async fn list(ctx: &mut HandlerContext<'_>) -> Result<Outcome, WebError> {
    let employees = ctx.state.employees.get_all().await;
    ctx.model.insert("employees", &employees)?;
    ctx.model
        .insert("departments", &ctx.state.departments.get_departments())?;
    Ok(Outcome::view("list"))
}

fn input(ctx: &mut HandlerContext<'_>) -> Result<Outcome, WebError> {
    ctx.model
        .insert("departments", &ctx.state.departments.get_departments())?;
    ctx.model.insert("employee", &Employee::default())?;
    Ok(Outcome::view("input"))
}

async fn save(ctx: &mut HandlerContext<'_>) -> Result<Outcome, WebError> {
    let mut employee = bind_employee(ctx)?;
    employee.id = None;
    check_department(ctx, &employee)?;

    logger::log_info(&format!("save: {employee:?}"));
    let saved = ctx.state.employees.save(employee).await;
    logger::log_debug(&format!("Employee stored with id {:?}", saved.id));
    Ok(Outcome::redirect(LIST_REDIRECT))
}

async fn edit(ctx: &mut HandlerContext<'_>) -> Result<Outcome, WebError> {
    let id = ctx.path_var_as::<u32>("id", "integer")?;
    let employee = ctx
        .state
        .employees
        .get(id)
        .await
        .ok_or(WebError::EmployeeNotFound(id))?;

    ctx.model
        .insert("departments", &ctx.state.departments.get_departments())?;
    ctx.model.insert("employee", &employee)?;
    Ok(Outcome::view("input"))
}

async fn update(ctx: &mut HandlerContext<'_>) -> Result<Outcome, WebError> {
    let employee = bind_employee(ctx)?;
    let id = employee
        .id
        .ok_or_else(|| WebError::MissingParameter("id".to_string()))?;
    if ctx.state.employees.get(id).await.is_none() {
        return Err(WebError::EmployeeNotFound(id));
    }
    check_department(ctx, &employee)?;

    logger::log_info(&format!("update: {employee:?}"));
    ctx.state.employees.save(employee).await;
    Ok(Outcome::redirect(LIST_REDIRECT))
}

async fn delete(ctx: &mut HandlerContext<'_>) -> Result<Outcome, WebError> {
    let id = ctx.path_var_as::<u32>("id", "integer")?;
    match ctx.state.employees.delete(id).await {
        Some(removed) => logger::log_info(&format!("delete: {removed:?}")),
        None => logger::log_debug(&format!("delete: employee {id} already absent")),
    }
    Ok(Outcome::redirect(LIST_REDIRECT))
}

fn bind_employee(ctx: &mut HandlerContext<'_>) -> Result<Employee, WebError> {
    resolve_model_attribute(
        &mut ctx.model,
        &ctx.session.attributes,
        &SessionAttributes::NONE,
        &ctx.request.params,
    )
}

/// Employees must reference an existing department
fn check_department(ctx: &HandlerContext<'_>, employee: &Employee) -> Result<(), WebError> {
    let department_id = employee
        .department_id
        .ok_or_else(|| WebError::MissingParameter("departmentId".to_string()))?;
    if ctx.state.departments.get_department(department_id).is_none() {
        return Err(WebError::UnknownDepartment(department_id));
    }
    Ok(())
}
